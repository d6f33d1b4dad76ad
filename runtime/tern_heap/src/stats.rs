//! Collector statistics.
//!
//! The heap is single-owner, so counters are plain integers rather than
//! atomics.

/// Cumulative statistics for one heap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeapStats {
    /// Total objects allocated since the heap was created.
    pub objects_allocated: u64,
    /// Number of completed collections.
    pub collections: u64,
    /// Total objects reclaimed by collections.
    pub objects_freed: u64,
    /// Total objects relocated by collections.
    pub objects_moved: u64,
    /// Total references offered during marking that did not point into the
    /// current space. A non-zero value means some holder kept a reference
    /// across a collection without exposing it as a root.
    pub stale_references: u64,
}

impl HeapStats {
    pub(crate) fn record(&mut self, collection: &CollectionStats) {
        self.collections += 1;
        self.objects_freed += collection.freed as u64;
        self.objects_moved += collection.survivors as u64;
        self.stale_references += collection.stale_references as u64;
    }
}

/// Outcome of a single collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    /// Objects in the heap before the collection.
    pub live_before: usize,
    /// Objects that survived (and therefore moved).
    pub survivors: usize,
    /// Objects reclaimed.
    pub freed: usize,
    /// References seen during marking that pointed outside the current space.
    pub stale_references: usize,
}
