//! Typed rows for the non-item tables.

/// Metadata about the most recent committed scan for a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMeta {
    /// Monotonically increasing scan identifier (unix nanoseconds).
    pub scan_id: i64,
    /// When the scan's build started, unix nanoseconds.
    pub built_at: i64,
    /// False iff the walker stopped at the item cap.
    pub complete: bool,
}
