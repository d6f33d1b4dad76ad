//! Tracing interfaces between the collector and everything that holds
//! references.
//!
//! The same visitor shape serves both phases of a collection: during marking
//! the visitor only reads the reference, during forwarding it overwrites it
//! with the relocated address. Implementations must therefore hand out the
//! reference mutably and must not cache copies elsewhere.

use crate::GcRef;

/// Receives every reference offered during a tracing pass.
pub trait RefVisitor {
    /// Visit one reference. The collector may rewrite `slot` in place.
    fn visit(&mut self, slot: &mut GcRef);
}

/// Heap objects that hold references to other heap objects.
///
/// `trace` must offer each contained reference exactly once per call.
/// A reference that is skipped is neither kept alive nor relocated, and
/// will dangle after the next collection.
pub trait Trace {
    fn trace(&mut self, visitor: &mut dyn RefVisitor);
}

/// Out-of-heap holders of references (registries, handle tables, stacks).
///
/// The collector calls `trace_roots` at every collection, once to mark and
/// once to forward. Only values are offered: any keys the provider indexes
/// by stay untouched, so hash-based containers never need rehashing.
pub trait RootProvider {
    fn trace_roots(&mut self, visitor: &mut dyn RefVisitor);
}

impl Trace for GcRef {
    #[inline]
    fn trace(&mut self, visitor: &mut dyn RefVisitor) {
        visitor.visit(self);
    }
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&mut self, visitor: &mut dyn RefVisitor) {
        if let Some(inner) = self {
            inner.trace(visitor);
        }
    }
}

impl<T: Trace> Trace for Vec<T> {
    fn trace(&mut self, visitor: &mut dyn RefVisitor) {
        for item in self {
            item.trace(visitor);
        }
    }
}

impl<T: RootProvider + ?Sized> RootProvider for Box<T> {
    fn trace_roots(&mut self, visitor: &mut dyn RefVisitor) {
        (**self).trace_roots(visitor);
    }
}
