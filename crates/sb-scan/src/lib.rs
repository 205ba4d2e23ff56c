//! sb-scan: directory walking, blacklist rules, and sidecar resolution.
//!
//! The walker drives the classifier and rule engine over configured share
//! roots and hands every accepted media item to a caller-supplied
//! callback, so the in-memory listing build and the DB indexer share one
//! traversal.

pub mod rules;
pub mod sidecar;
pub mod walker;

pub use rules::{is_blocked_size, is_blocked_string, parse_size};
pub use sidecar::{find_audio_sidecars, find_sidecar_subtitles, DirCache};
pub use walker::{walk_shares, WalkOutcome, WALK_ITEM_CEILING};
