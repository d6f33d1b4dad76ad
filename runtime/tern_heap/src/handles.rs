//! Explicit roots for references held by native code.
//!
//! A [`GcRef`] on the Rust stack is invisible to the collector. Code that
//! must hold a reference across a safepoint (an evaluator building a
//! module object while a nested import runs, for example) roots it here
//! and reads it back afterwards.

use crate::trace::{RefVisitor, RootProvider};
use crate::GcRef;

/// Index into a [`HandleTable`].
///
/// Handles carry a generation so that a released-and-reused slot is not
/// mistaken for the original root.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    object: Option<GcRef>,
}

/// Table of rooted references.
#[derive(Debug, Default)]
pub struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root `object` until the returned handle is released.
    pub fn root(&mut self, object: GcRef) -> Handle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    /// Current (possibly relocated) reference for `handle`.
    pub fn get(&self, handle: Handle) -> Option<GcRef> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation == handle.generation {
            slot.object
        } else {
            None
        }
    }

    /// Stop rooting `handle`, returning its final reference.
    pub fn release(&mut self, handle: Handle) -> Option<GcRef> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(object)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

impl RootProvider for HandleTable {
    fn trace_roots(&mut self, visitor: &mut dyn RefVisitor) {
        for object in self.slots.iter_mut().filter_map(|slot| slot.object.as_mut()) {
            visitor.visit(object);
        }
    }
}
