//! The collected heap.
//!
//! Objects live in a single contiguous space addressed from `base`.
//! Allocation appends to the space. Collection marks everything reachable
//! from the supplied roots, copies survivors into a new space whose
//! addresses start past the end of the old one, then forwards every
//! reference held by survivors and roots. Because the new range never
//! overlaps the old one, every survivor changes address at every
//! collection, and a reference that missed forwarding cannot alias a
//! different live object.

use crate::stats::{CollectionStats, HeapStats};
use crate::trace::{RefVisitor, RootProvider, Trace};
use crate::{GcRef, HeapConfig};

/// Address range of one space.
#[derive(Copy, Clone, Debug)]
struct Space {
    base: u64,
    len: usize,
}

impl Space {
    #[inline]
    fn index_of(self, r: GcRef) -> Option<usize> {
        let offset = r.address().checked_sub(self.base)?;
        let index = usize::try_from(offset).ok()?;
        (index < self.len).then_some(index)
    }

    #[inline]
    fn end(self) -> u64 {
        self.base + self.len as u64
    }
}

/// A garbage-collected heap of `T` objects.
///
/// The heap never collects on its own; callers decide when a safepoint
/// has been reached ([`Heap::should_collect`]) and supply the complete
/// root set to [`Heap::collect`].
pub struct Heap<T> {
    objects: Vec<T>,
    base: u64,
    config: HeapConfig,
    stats: HeapStats,
    allocated_since_collection: usize,
}

impl<T: Trace> Heap<T> {
    /// Create an empty heap.
    pub fn new(config: HeapConfig) -> Self {
        Heap {
            objects: Vec::new(),
            base: 0,
            config,
            stats: HeapStats::default(),
            allocated_since_collection: 0,
        }
    }

    /// Allocate `value` and return its address.
    ///
    /// The returned reference is only kept alive and forwarded if it is
    /// reachable from a root by the time the next collection runs.
    pub fn alloc(&mut self, value: T) -> GcRef {
        let r = GcRef::from_address(self.space().end());
        self.objects.push(value);
        self.allocated_since_collection += 1;
        self.stats.objects_allocated += 1;
        r
    }

    /// Look up a live object. Returns `None` for stale or foreign references.
    pub fn get(&self, r: GcRef) -> Option<&T> {
        let index = self.space().index_of(r)?;
        self.objects.get(index)
    }

    /// Mutable variant of [`Heap::get`].
    pub fn get_mut(&mut self, r: GcRef) -> Option<&mut T> {
        let index = self.space().index_of(r)?;
        self.objects.get_mut(index)
    }

    /// Whether `r` addresses an object in the current space.
    pub fn contains(&self, r: GcRef) -> bool {
        self.space().index_of(r).is_some()
    }

    /// Number of objects currently in the heap (live or not yet collected).
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    pub fn stats(&self) -> &HeapStats {
        &self.stats
    }

    /// Whether a safepoint reached now should collect.
    pub fn should_collect(&self) -> bool {
        self.config.stress || self.allocated_since_collection >= self.config.collect_threshold
    }

    /// Run a full collection.
    ///
    /// `roots` must contain every out-of-heap holder of references. Objects
    /// not reachable from them are dropped; survivors are relocated and all
    /// references offered by survivors and roots are rewritten.
    pub fn collect(&mut self, roots: &mut [&mut dyn RootProvider]) -> CollectionStats {
        let from = self.space();

        // Mark
        let mut marker = Marker {
            space: from,
            marked: vec![false; from.len],
            worklist: Vec::new(),
            stale: 0,
        };
        for provider in roots.iter_mut() {
            provider.trace_roots(&mut marker);
        }
        while let Some(index) = marker.worklist.pop() {
            self.objects[index].trace(&mut marker);
        }

        // Copy survivors into a fresh address range
        let to_base = from.end();
        let mut forwarding: Vec<Option<GcRef>> = vec![None; from.len];
        let mut survivors = Vec::with_capacity(marker.marked.iter().filter(|m| **m).count());
        let old_objects = std::mem::take(&mut self.objects);
        for (index, (object, live)) in old_objects.into_iter().zip(&marker.marked).enumerate() {
            if *live {
                forwarding[index] = Some(GcRef::from_address(to_base + survivors.len() as u64));
                survivors.push(object);
            }
        }

        let stats = CollectionStats {
            live_before: from.len,
            survivors: survivors.len(),
            freed: from.len - survivors.len(),
            stale_references: marker.stale,
        };

        self.base = to_base;
        self.objects = survivors;

        // Forward references held by survivors and roots
        let mut forwarder = Forwarder {
            from,
            forwarding: &forwarding,
        };
        for object in &mut self.objects {
            object.trace(&mut forwarder);
        }
        for provider in roots.iter_mut() {
            provider.trace_roots(&mut forwarder);
        }

        self.allocated_since_collection = 0;
        self.stats.record(&stats);

        if stats.stale_references > 0 {
            tracing::warn!(
                stale = stats.stale_references,
                "collection saw references outside the current space"
            );
        }
        tracing::debug!(
            live_before = stats.live_before,
            survivors = stats.survivors,
            freed = stats.freed,
            base = to_base,
            "collection finished"
        );

        stats
    }

    #[inline]
    fn space(&self) -> Space {
        Space {
            base: self.base,
            len: self.objects.len(),
        }
    }
}

/// Mark-phase visitor: records reachable slots, never rewrites.
struct Marker {
    space: Space,
    marked: Vec<bool>,
    worklist: Vec<usize>,
    stale: usize,
}

impl RefVisitor for Marker {
    fn visit(&mut self, slot: &mut GcRef) {
        match self.space.index_of(*slot) {
            Some(index) => {
                if !self.marked[index] {
                    self.marked[index] = true;
                    self.worklist.push(index);
                }
            }
            None => self.stale += 1,
        }
    }
}

/// Forward-phase visitor: rewrites old-space addresses to new ones.
struct Forwarder<'a> {
    from: Space,
    forwarding: &'a [Option<GcRef>],
}

impl RefVisitor for Forwarder<'_> {
    fn visit(&mut self, slot: &mut GcRef) {
        if let Some(index) = self.from.index_of(*slot) {
            if let Some(new) = self.forwarding[index] {
                *slot = new;
            }
        }
    }
}
