//! The cache coordinator: single-flight builds with stale-while-revalidate.
//!
//! State lives behind one mutex and is held only for pointer swaps; all
//! I/O (walking, DB work, disk cache) happens unlocked. A condition
//! variable wakes anyone parked on [`MediaCache::wait_idle`] when a build
//! installs. Stale-while-revalidate rebuilds run on a dedicated worker
//! thread; at most one build is ever in flight per coordinator.

use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use sb_core::config::{BlacklistConfig, Share};
use sb_core::MediaResponse;
use sb_db::DbPool;

use crate::build;
use crate::etag::weak_etag;
use crate::key::media_cache_key;

/// Default freshness window for the cached payload.
const DEFAULT_TTL: Duration = Duration::from_secs(120);

#[derive(Default)]
struct CacheState {
    key: String,
    /// Unix nanoseconds of the installed build; 0 = nothing installed.
    built_at: i64,
    etag: String,
    /// The response pre-serialized to JSON so repeat deliveries skip
    /// re-encoding.
    payload: Arc<Vec<u8>>,
    building: bool,
}

/// On-disk fallback snapshot used when no index store is configured.
#[derive(Serialize, Deserialize)]
struct DiskCache {
    key: String,
    #[serde(rename = "builtAt")]
    built_at: i64,
    etag: String,
    resp: MediaResponse,
}

/// Coordinator owning the in-memory listing payload and build-in-flight
/// flag.
pub struct MediaCache {
    state: Mutex<CacheState>,
    cond: Condvar,
    ttl: Duration,
    db: Option<DbPool>,
    disk_cache_path: PathBuf,
    cancel: CancellationToken,
    /// Self-handle for hopping onto the rebuild worker thread.
    weak_self: Weak<MediaCache>,
}

impl MediaCache {
    /// Create a coordinator. `db = None` enables the disk fallback cache
    /// at `disk_cache_path`.
    pub fn new(db: Option<DbPool>, disk_cache_path: PathBuf) -> Arc<Self> {
        Self::with_ttl(db, disk_cache_path, DEFAULT_TTL)
    }

    /// Create a coordinator with a custom TTL (tests).
    pub fn with_ttl(db: Option<DbPool>, disk_cache_path: PathBuf, ttl: Duration) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            state: Mutex::new(CacheState::default()),
            cond: Condvar::new(),
            ttl,
            db,
            disk_cache_path,
            cancel: CancellationToken::new(),
            weak_self: weak.clone(),
        })
    }

    /// Token cancelled on shutdown; builds poll it between entries.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel any in-flight build (shutdown path).
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Fetch the listing for the given inputs, building as needed.
    ///
    /// Never blocks on another caller's build: when one is in flight the
    /// current (possibly stale, possibly empty) payload is returned with
    /// `scanning = true`.
    pub fn get_or_build(
        &self,
        shares: &[Share],
        blacklist: &BlacklistConfig,
        refresh: bool,
        max_items: usize,
    ) -> (MediaResponse, String) {
        let key = media_cache_key(shares, blacklist);
        let mut tried_hydrate = false;

        loop {
            let mut st = self.state.lock();

            // Fresh or stale hit on the current key.
            if st.key == key && st.built_at != 0 && !refresh {
                let age = build::now_unix_nanos().saturating_sub(st.built_at);
                if age >= self.ttl.as_nanos() as i64 && !st.building {
                    st.building = true;
                    self.spawn_rebuild(key.clone(), shares.to_vec(), blacklist.clone(), max_items);
                }
                let resp = decode_payload(&st.payload);
                return (resp, st.etag.clone());
            }

            // Someone else is building: serve what we have, flagged.
            if st.building {
                let mut resp = decode_payload(&st.payload);
                resp.scanning = true;
                return (resp, st.etag.clone());
            }

            // Explicit refresh: kick a background rebuild, serve current.
            if refresh {
                st.building = true;
                self.spawn_rebuild(key.clone(), shares.to_vec(), blacklist.clone(), max_items);
                let mut resp = decode_payload(&st.payload);
                resp.scanning = true;
                return (resp, st.etag.clone());
            }

            // Key changed (or cold start): try hydrating without a walk.
            if st.key != key && !tried_hydrate {
                drop(st);
                tried_hydrate = true;
                if self.try_hydrate(&key, shares) {
                    continue; // installed; the hit branch serves it
                }
                continue; // fall through to a synchronous build
            }

            // Nothing cached anywhere: build synchronously.
            st.building = true;
            drop(st);
            break;
        }

        let (resp, built_at) = self.run_build(&key, shares, blacklist, max_items);
        let etag = weak_etag(&key, built_at);
        self.install(&key, built_at, &etag, &resp);
        (resp, etag)
    }

    /// Drop all cached state and the on-disk fallback file. The next
    /// request observes the configuration change.
    pub fn invalidate(&self) {
        {
            let mut st = self.state.lock();
            st.key.clear();
            st.etag.clear();
            st.built_at = 0;
            st.payload = Arc::new(Vec::new());
        }
        let _ = std::fs::remove_file(&self.disk_cache_path);
    }

    /// Park until no build is in flight (tests and shutdown).
    pub fn wait_idle(&self) {
        let mut st = self.state.lock();
        while st.building {
            self.cond.wait(&mut st);
        }
    }

    /// Current ETag, if anything is installed.
    pub fn current_etag(&self) -> Option<String> {
        let st = self.state.lock();
        if st.etag.is_empty() {
            None
        } else {
            Some(st.etag.clone())
        }
    }

    // -- internals --------------------------------------------------------

    /// Hydrate from the index store (or the disk snapshot when storeless).
    fn try_hydrate(&self, key: &str, shares: &[Share]) -> bool {
        if let Some(ref pool) = self.db {
            match build::load_media_from_db(pool, key, shares) {
                Ok(Some((resp, built_at))) => {
                    let etag = weak_etag(key, built_at);
                    self.install_quiet(key, built_at, &etag, &resp);
                    return true;
                }
                Ok(None) => return false,
                Err(e) => {
                    tracing::warn!(error = %e, "index hydrate failed");
                    return false;
                }
            }
        }
        self.load_disk_cache(key)
    }

    /// Run one build, falling back to the in-memory walk when the store
    /// path fails. Returns the response and its build instant.
    fn run_build(
        &self,
        key: &str,
        shares: &[Share],
        blacklist: &BlacklistConfig,
        max_items: usize,
    ) -> (MediaResponse, i64) {
        if let Some(ref pool) = self.db {
            match build::reindex_and_load(pool, key, shares, blacklist, max_items, &self.cancel) {
                Ok((resp, built_at)) if built_at > 0 => return (resp, built_at),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "index build failed, walking in memory");
                }
            }
        }
        let resp = build::build_media_response_in_memory(shares, blacklist, max_items, &self.cancel)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "in-memory build aborted");
                MediaResponse::default()
            });
        (resp, build::now_unix_nanos())
    }

    /// Install a finished build, clear the building flag, wake waiters.
    fn install(&self, key: &str, built_at: i64, etag: &str, resp: &MediaResponse) {
        let payload = Arc::new(serde_json::to_vec(resp).unwrap_or_default());
        {
            let mut st = self.state.lock();
            st.key = key.to_string();
            st.built_at = built_at;
            st.etag = etag.to_string();
            st.payload = payload;
            st.building = false;
            self.cond.notify_all();
        }
        if self.db.is_none() {
            self.save_disk_cache(key, built_at, etag, resp);
        }
    }

    /// Install hydrated state without touching the building flag.
    fn install_quiet(&self, key: &str, built_at: i64, etag: &str, resp: &MediaResponse) {
        let payload = Arc::new(serde_json::to_vec(resp).unwrap_or_default());
        let mut st = self.state.lock();
        st.key = key.to_string();
        st.built_at = built_at;
        st.etag = etag.to_string();
        st.payload = payload;
    }

    /// Kick a rebuild on a worker thread. The caller must have set
    /// `building = true` under the lock.
    fn spawn_rebuild(
        &self,
        key: String,
        shares: Vec<Share>,
        blacklist: BlacklistConfig,
        max_items: usize,
    ) {
        // Upgrading succeeds while any Arc to this coordinator is live.
        let Some(this) = self.weak_self.upgrade() else {
            self.state.lock().building = false;
            return;
        };
        std::thread::spawn(move || {
            let (resp, built_at) = this.run_build(&key, &shares, &blacklist, max_items);
            let etag = weak_etag(&key, built_at);
            this.install(&key, built_at, &etag, &resp);
        });
    }

    /// Rehydrate state from the disk snapshot when its key matches.
    fn load_disk_cache(&self, key: &str) -> bool {
        if self.db.is_some() {
            return false;
        }
        let bytes = match std::fs::read(&self.disk_cache_path) {
            Ok(b) if !b.is_empty() => b,
            _ => return false,
        };
        let snap: DiskCache = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(_) => return false,
        };
        if snap.key != key || snap.built_at <= 0 {
            return false;
        }
        self.install_quiet(key, snap.built_at, &snap.etag, &snap.resp);
        true
    }

    /// Persist the latest build next to the config file (tmp + rename).
    fn save_disk_cache(&self, key: &str, built_at: i64, etag: &str, resp: &MediaResponse) {
        let snap = DiskCache {
            key: key.to_string(),
            built_at,
            etag: etag.to_string(),
            resp: resp.clone(),
        };
        let bytes = match serde_json::to_vec(&snap) {
            Ok(b) => b,
            Err(_) => return,
        };
        let tmp = self.disk_cache_path.with_extension("json.tmp");
        if std::fs::write(&tmp, &bytes).is_ok() {
            let _ = std::fs::rename(&tmp, &self.disk_cache_path);
        }
    }
}

fn decode_payload(payload: &Arc<Vec<u8>>) -> MediaResponse {
    if payload.is_empty() {
        return MediaResponse::default();
    }
    serde_json::from_slice(payload).unwrap_or_default()
}
