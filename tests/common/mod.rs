//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a temp share directory, an
//! in-memory index database, the cache coordinator, and the full Axum
//! router on a random port for HTTP-level testing.

use std::net::SocketAddr;
use std::path::Path;

use sb_cache::MediaCache;
use sb_core::config::{Config, Share};
use sb_db::{init_memory_pool, DbPool};
use sb_server::{build_router, AppContext, ConfigStore};

/// A fully-wired application context over temp directories.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    /// Default share root, labeled "A" in the config.
    pub media: tempfile::TempDir,
    /// Scratch dir holding the coordinator's disk-cache path.
    pub scratch: tempfile::TempDir,
}

impl TestHarness {
    /// Harness with one share ("A" -> temp dir) and default config.
    pub fn new() -> Self {
        Self::with_config_fn(|_| {})
    }

    /// Harness with one share and a caller-adjusted config.
    pub fn with_config_fn(adjust: impl FnOnce(&mut Config)) -> Self {
        let media = tempfile::tempdir().expect("media tempdir");
        let scratch = tempfile::tempdir().expect("scratch tempdir");

        let mut config = Config::default();
        config.shares = vec![Share {
            label: "A".into(),
            path: media.path().to_string_lossy().to_string(),
        }];
        adjust(&mut config);

        let db = init_memory_pool().expect("in-memory pool");
        let cache = MediaCache::new(Some(db.clone()), scratch.path().join("media_cache.json"));
        let store = ConfigStore::new(config, None);
        let ctx = AppContext::new(Some(db.clone()), store, cache);

        Self {
            ctx,
            db,
            media,
            scratch,
        }
    }

    /// Start the router on a random port.
    pub async fn serve(&self) -> SocketAddr {
        let app = build_router(self.ctx.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind random port");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        addr
    }

    /// Write a file under the default share.
    pub fn write_media(&self, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = self.media.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, bytes).expect("write media file");
        path
    }

    /// The opaque stream/probe id for a path.
    pub fn id_for(&self, path: &Path) -> String {
        sb_core::encode_id(path)
    }
}
