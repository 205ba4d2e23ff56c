//! sb-cache: the media listing cache coordinator.
//!
//! Owns the serialized listing payload, its cache key and weak ETag, and
//! the single build-in-flight flag. Builds run through the walker into
//! the index store (or fully in memory when no store is configured) and
//! are deduplicated: concurrent demand for one key triggers one build.

pub mod build;
pub mod coordinator;
pub mod etag;
pub mod key;

pub use coordinator::MediaCache;
pub use etag::weak_etag;
pub use key::media_cache_key;
