//! Collector configuration.

/// Configuration for a [`Heap`](crate::Heap).
///
/// # Example
///
/// ```text
/// let config = HeapConfig {
///     collect_threshold: 64,
///     ..HeapConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeapConfig {
    /// Number of allocations since the last collection after which the
    /// next safepoint collects.
    ///
    /// Default: 1024
    pub collect_threshold: usize,

    /// Collect at every safepoint regardless of allocation volume.
    ///
    /// Slow, but flushes out references that are held outside a root:
    /// every object moves at every safepoint.
    ///
    /// Default: false
    pub stress: bool,
}

impl HeapConfig {
    /// Default allocation threshold between collections.
    pub const DEFAULT_COLLECT_THRESHOLD: usize = 1024;

    /// Configuration that collects at every safepoint.
    pub fn stress() -> Self {
        HeapConfig {
            stress: true,
            ..HeapConfig::default()
        }
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        HeapConfig {
            collect_threshold: Self::DEFAULT_COLLECT_THRESHOLD,
            stress: false,
        }
    }
}
