//! The runtime context.
//!
//! A [`Context`] owns everything one script environment needs to import
//! modules: the heap, both module registries, the handle table of explicit
//! roots, the loader and the evaluator. The heap is private; every
//! collection goes through [`Context::collect_garbage`], which always
//! passes the registries and handles as roots.
//!
//! Import resolution lives in the `resolver` submodule.

mod resolver;

use crate::config::RuntimeConfig;
use crate::evaluator::ModuleEvaluator;
use crate::id::ModuleId;
use crate::loader::{ResourceBundle, SchemeLoaders, SourceLoader};
use crate::object::{HeapObject, ModuleObject};
use crate::registry::ModuleRegistry;
use smallvec::SmallVec;
use std::rc::Rc;
use tern_heap::{
    CollectionStats, GcRef, Handle, HandleTable, Heap, HeapStats, RootProvider,
};

/// One script environment's module cache and heap.
///
/// Single-owner and `!Send`. Imports may re-enter the context from inside
/// the evaluator on the same thread.
pub struct Context {
    heap: Heap<HeapObject>,
    /// Modules imported by identifier or URI.
    modules: ModuleRegistry,
    /// Modules found through the search path, keyed by bare specifier.
    internal_modules: ModuleRegistry,
    handles: HandleTable,
    loader: Box<dyn SourceLoader>,
    evaluator: Rc<dyn ModuleEvaluator>,
    config: RuntimeConfig,
    /// Identifiers of the imports currently in progress, outermost first.
    import_stack: SmallVec<[ModuleId; 8]>,
}

impl Context {
    /// Context with the default configuration and built-in loaders.
    pub fn new(evaluator: impl ModuleEvaluator + 'static) -> Self {
        ContextBuilder::new(evaluator).build()
    }

    pub fn builder(evaluator: impl ModuleEvaluator + 'static) -> ContextBuilder {
        ContextBuilder::new(evaluator)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Registry of modules imported by identifier or URI.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Registry of modules resolved through the search path.
    pub fn internal_registry(&self) -> &ModuleRegistry {
        &self.internal_modules
    }

    /// Cached module object for `id` in the main registry.
    pub fn lookup(&self, id: &str) -> Option<GcRef> {
        self.modules.lookup(id)
    }

    // Heap access

    /// Allocate an object. Never collects.
    pub fn alloc(&mut self, object: impl Into<HeapObject>) -> GcRef {
        self.heap.alloc(object.into())
    }

    pub fn object(&self, r: GcRef) -> Option<&HeapObject> {
        self.heap.get(r)
    }

    pub fn object_mut(&mut self, r: GcRef) -> Option<&mut HeapObject> {
        self.heap.get_mut(r)
    }

    pub fn module(&self, r: GcRef) -> Option<&ModuleObject> {
        self.heap.get(r).and_then(HeapObject::as_module)
    }

    pub fn module_mut(&mut self, r: GcRef) -> Option<&mut ModuleObject> {
        self.heap.get_mut(r).and_then(HeapObject::as_module_mut)
    }

    /// Number of objects currently in the heap.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    pub fn heap_stats(&self) -> &HeapStats {
        self.heap.stats()
    }

    // Rooting

    /// Keep `r` alive, and track its relocation, until [`unroot`](Self::unroot).
    pub fn root(&mut self, r: GcRef) -> Handle {
        self.handles.root(r)
    }

    /// Current reference behind `handle`.
    pub fn rooted(&self, handle: Handle) -> Option<GcRef> {
        self.handles.get(handle)
    }

    /// Release `handle`, returning its current reference.
    pub fn unroot(&mut self, handle: Handle) -> Option<GcRef> {
        self.handles.release(handle)
    }

    // Collection

    /// Collect if the heap asks for it.
    ///
    /// Every unrooted `GcRef` held by the caller is stale afterwards if a
    /// collection ran.
    pub fn safepoint(&mut self) -> Option<CollectionStats> {
        if self.heap.should_collect() {
            Some(self.collect_garbage())
        } else {
            None
        }
    }

    /// Collect now.
    pub fn collect_garbage(&mut self) -> CollectionStats {
        let mut roots: [&mut dyn RootProvider; 3] = [
            &mut self.modules,
            &mut self.internal_modules,
            &mut self.handles,
        ];
        let stats = self.heap.collect(&mut roots);
        tracing::debug!(
            survivors = stats.survivors,
            freed = stats.freed,
            modules = self.modules.len(),
            internal_modules = self.internal_modules.len(),
            handles = self.handles.len(),
            "collected module heap"
        );
        stats
    }

    // Import state

    /// Identifiers of imports in progress, outermost first.
    pub fn import_stack(&self) -> &[ModuleId] {
        &self.import_stack
    }

    pub fn is_importing(&self, id: &str) -> bool {
        self.import_stack.iter().any(|entry| entry.as_str() == id)
    }
}

/// Builder for [`Context`].
///
/// ```text
/// let cx = Context::builder(MyEvaluator::new())
///     .config(RuntimeConfig::from_env())
///     .resources(bundle)
///     .build();
/// ```
pub struct ContextBuilder {
    evaluator: Rc<dyn ModuleEvaluator>,
    config: Option<RuntimeConfig>,
    loader: Option<Box<dyn SourceLoader>>,
    resources: Option<ResourceBundle>,
}

impl ContextBuilder {
    pub fn new(evaluator: impl ModuleEvaluator + 'static) -> Self {
        ContextBuilder {
            evaluator: Rc::new(evaluator),
            config: None,
            loader: None,
            resources: None,
        }
    }

    /// Set the runtime configuration. Defaults to `RuntimeConfig::default()`.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the built-in scheme loaders entirely.
    #[must_use]
    pub fn loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Bundle served to `resource://` URIs by the built-in loaders.
    ///
    /// Ignored when a custom [`loader`](Self::loader) is set.
    #[must_use]
    pub fn resources(mut self, bundle: ResourceBundle) -> Self {
        self.resources = Some(bundle);
        self
    }

    pub fn build(self) -> Context {
        let config = self.config.unwrap_or_default();
        let loader = self.loader.unwrap_or_else(|| {
            Box::new(SchemeLoaders::with_defaults(
                self.resources.unwrap_or_default(),
            ))
        });

        Context {
            heap: Heap::new(config.heap.clone()),
            modules: ModuleRegistry::new(),
            internal_modules: ModuleRegistry::new(),
            handles: HandleTable::new(),
            loader,
            evaluator: self.evaluator,
            config,
            import_stack: SmallVec::new(),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
