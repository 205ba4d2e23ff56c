//! sb-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage for the media index with
//! connection pooling, embedded migrations, and query modules for media
//! items, scan metadata, and user preferences.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use models::ScanMeta;
pub use pool::{get_conn, init_memory_pool, init_pool, DbPool, PooledConnection};
