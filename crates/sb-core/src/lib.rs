//! sb-core: shared types, IDs, errors, configuration, and the media model.
//!
//! This crate is the foundational dependency for all other sb-* crates,
//! providing the path/ID codec, path authorization helpers, a unified
//! error type, the media-domain enums, and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;
pub mod paths;

// Re-export the most commonly used items at the crate root.
pub use config::{BlacklistConfig, Config, Share};
pub use error::{Error, Result};
pub use ids::{decode_id, encode_id};
pub use media::{MediaItem, MediaKind, MediaResponse, Subtitle};
