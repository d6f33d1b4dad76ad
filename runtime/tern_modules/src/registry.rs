//! The per-context module registry.
//!
//! Maps module identifiers to collector-visible references. Keys are
//! immutable strings hashed once on insertion; values are offered to the
//! collector through [`RootProvider`] and rewritten in place when their
//! referents move. A collection therefore never touches the table's
//! hashing, only the stored references.
//!
//! Entries are created by the import resolver and live until the registry
//! (and with it the owning context) is dropped. There is no eviction.

use crate::id::ModuleId;
use rustc_hash::FxHashMap;
use std::fmt;
use tern_heap::{GcRef, RefVisitor, RootProvider};

/// Cache of instantiated modules for one runtime context.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    entries: FxHashMap<ModuleId, GcRef>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached object for `id`, if any.
    ///
    /// The returned reference is current until the next collection.
    #[inline]
    pub fn lookup(&self, id: &str) -> Option<GcRef> {
        self.entries.get(id).copied()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Register `object` under `id`.
    ///
    /// # Panics
    ///
    /// If `id` is already registered. The resolver checks for an existing
    /// entry before publishing, so reaching this is a resolver bug, not a
    /// recoverable condition.
    pub fn insert(&mut self, id: ModuleId, object: GcRef) {
        if let Some(existing) = self.entries.get(&id) {
            panic!(
                "{}",
                RegistryInvariantViolation {
                    id,
                    existing: *existing,
                }
            );
        }
        self.entries.insert(id, object);
    }

    /// Withdraw an entry whose top-level evaluation failed.
    ///
    /// Only the resolver's rollback path may call this; completed modules
    /// are never removed.
    pub(crate) fn withdraw(&mut self, id: &str) -> Option<GcRef> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers, in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.entries.keys()
    }
}

impl RootProvider for ModuleRegistry {
    fn trace_roots(&mut self, visitor: &mut dyn RefVisitor) {
        for object in self.entries.values_mut() {
            visitor.visit(object);
        }
    }
}

/// A second insertion of an already-registered identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryInvariantViolation {
    pub id: ModuleId,
    pub existing: GcRef,
}

impl fmt::Display for RegistryInvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "registry invariant violated: module '{}' is already registered as {}",
            self.id, self.existing
        )
    }
}

impl std::error::Error for RegistryInvariantViolation {}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
