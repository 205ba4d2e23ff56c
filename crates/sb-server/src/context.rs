//! Shared application context and the mutable configuration store.
//!
//! [`AppContext`] is the state handed to every route handler; it is
//! cheaply cloneable because it only holds `Arc`s and handles.
//! [`ConfigStore`] guards the live [`Config`] behind a readers-writer
//! lock and persists every mutation atomically (write-tmp-then-rename),
//! so a crash mid-write never corrupts the config file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use sb_av::TranscodeGate;
use sb_cache::MediaCache;
use sb_core::config::{Config, Share};
use sb_core::paths::{dedupe_shares, normalize_shares};
use sb_core::{Error, Result};
use sb_db::DbPool;

/// Mutable runtime configuration with atomic persistence.
#[derive(Debug)]
pub struct ConfigStore {
    inner: RwLock<Config>,
    /// Path of the config file; `None` disables persistence (tests).
    path: Option<PathBuf>,
}

impl ConfigStore {
    /// Wrap an in-memory config with optional persistence.
    pub fn new(config: Config, path: Option<PathBuf>) -> Self {
        Self {
            inner: RwLock::new(config),
            path,
        }
    }

    /// Load the config file, creating it with defaults when absent.
    pub fn load_or_init(path: PathBuf) -> Result<Self> {
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let mut cfg = Config::from_json(&contents)?;
                cfg.shares = dedupe_shares(normalize_shares(&cfg.shares));
                Ok(Self::new(cfg, Some(path)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let store = Self::new(Config::default(), Some(path));
                store.persist(&store.snapshot())?;
                Ok(store)
            }
            Err(e) => Err(Error::Io { source: e }),
        }
    }

    /// Clone of the current config.
    pub fn snapshot(&self) -> Config {
        self.inner.read().clone()
    }

    /// Clone of the current share list.
    pub fn shares(&self) -> Vec<Share> {
        self.inner.read().shares.clone()
    }

    /// Mutate the config, renormalize its shares, persist, and return the
    /// result. The write lock is held only for the in-memory swap.
    pub fn update<F>(&self, mutate: F) -> Result<Config>
    where
        F: FnOnce(&mut Config),
    {
        let updated = {
            let mut guard = self.inner.write();
            mutate(&mut guard);
            guard.shares = dedupe_shares(normalize_shares(&guard.shares));
            guard.clone()
        };
        self.persist(&updated)?;
        Ok(updated)
    }

    /// Path of the config file, when persistence is enabled.
    pub fn config_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, cfg: &Config) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(cfg)
            .map_err(|e| Error::Internal(format!("config serialization failed: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Application context shared by all request handlers (via Axum state).
#[derive(Clone)]
pub struct AppContext {
    /// Index store pool; `None` switches the coordinator to its disk
    /// fallback cache.
    pub db: Option<DbPool>,
    /// Live configuration.
    pub store: Arc<ConfigStore>,
    /// Listing cache coordinator.
    pub cache: Arc<MediaCache>,
    /// Transcode admission gate.
    pub gate: TranscodeGate,
    /// Remote IPs seen so far, for first-contact logging.
    pub seen_ips: Arc<DashMap<String, ()>>,
}

impl AppContext {
    /// Assemble a context from its parts.
    pub fn new(db: Option<DbPool>, store: ConfigStore, cache: Arc<MediaCache>) -> Self {
        Self {
            db,
            store: Arc::new(store),
            cache,
            gate: TranscodeGate::new(),
            seen_ips: Arc::new(DashMap::new()),
        }
    }
}
