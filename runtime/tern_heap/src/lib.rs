//! Tern Heap - moving tracing collector for the Tern runtime.
//!
//! This crate is the collector side of the module cache: it owns every
//! runtime object, discovers live objects by tracing from registered roots,
//! and relocates survivors on each collection.
//!
//! # Architecture
//!
//! ```text
//! Heap<T: Trace>
//!   ├── alloc()    bump allocation into the current space
//!   └── collect()  mark from roots → copy survivors → forward references
//!         ↑
//!   RootProvider::trace_roots(&mut dyn RefVisitor)
//!         ├── module registries (tern_modules)
//!         └── HandleTable (explicit temporary roots)
//! ```
//!
//! # Relocation
//!
//! Every collection moves every surviving object to a fresh address range.
//! A [`GcRef`] that was not offered to the collector through a root is stale
//! afterwards and [`Heap::get`] returns `None` for it. Holders of references
//! must therefore either live inside a [`RootProvider`] or re-read their
//! reference from one after each safepoint.

mod config;
mod handles;
mod heap;
mod stats;
mod trace;

pub use config::HeapConfig;
pub use handles::{Handle, HandleTable};
pub use heap::Heap;
pub use stats::{CollectionStats, HeapStats};
pub use trace::{RefVisitor, RootProvider, Trace};

use std::fmt;

/// Address of an object in a [`Heap`].
///
/// A `GcRef` is plain data: copying it does not keep the referent alive.
/// The collector keeps an object alive only if some root (or some live
/// object) offers the reference during tracing, and rewrites the reference
/// in place when it relocates the object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GcRef(u64);

impl GcRef {
    #[inline]
    pub(crate) const fn from_address(address: u64) -> Self {
        GcRef(address)
    }

    /// Raw address of the referent in the heap's current numbering.
    #[inline]
    pub const fn address(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gc@{:#x}", self.0)
    }
}
