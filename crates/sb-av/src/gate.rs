//! Bounded admission gate for transcode sessions.
//!
//! A counting semaphore with capacity 2 keeps ffmpeg from starving the
//! host CPU. Acquisition never blocks: a full gate is an immediate
//! [`sb_core::Error::Busy`]. The permit travels inside the returned
//! stream and releases on drop, which makes double-release impossible.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use sb_core::{Error, Result};

/// Maximum concurrent transcode sessions.
pub const MAX_SESSIONS: usize = 2;

/// Admission gate over subprocess pipelines.
#[derive(Clone)]
pub struct TranscodeGate {
    semaphore: Arc<Semaphore>,
}

impl TranscodeGate {
    /// Gate with the default capacity of [`MAX_SESSIONS`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }

    /// Gate with a custom capacity (tests).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Try to claim a session slot without waiting.
    pub fn try_acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|_| Error::Busy("max transcode limit reached".into()))
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for TranscodeGate {
    fn default() -> Self {
        Self::new()
    }
}
