//! The evaluator seam.
//!
//! The resolver knows nothing about the scripting language. It hands the
//! loaded bytes to a [`ModuleEvaluator`], which compiles them, allocates
//! the module object in the context's heap, and later runs top-level code.

use crate::context::Context;
use crate::errors::EvaluationError;
use crate::id::ModuleId;
use crate::uri::ModuleUri;
use std::rc::Rc;
use tern_heap::GcRef;

/// The scope an import is requested from.
///
/// Carries the importing module's identifier and location rather than its
/// object: both stay valid across collections, a `GcRef` does not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportScope {
    importer: Option<ModuleId>,
    location: Option<ModuleUri>,
}

impl ImportScope {
    /// Scope of an import issued by the embedder, outside any module.
    pub fn top_level() -> Self {
        Self::default()
    }

    /// Scope of an import issued by the module registered as `importer`.
    ///
    /// Relative specifiers resolve against `location`. When it is `None`
    /// the importer's module object is consulted instead, which only works
    /// once the importer has been published.
    pub fn module(importer: ModuleId, location: Option<ModuleUri>) -> Self {
        ImportScope {
            importer: Some(importer),
            location,
        }
    }

    pub fn importer(&self) -> Option<&ModuleId> {
        self.importer.as_ref()
    }

    pub fn location(&self) -> Option<&ModuleUri> {
        self.location.as_ref()
    }
}

/// Source bytes of a module about to be compiled.
#[derive(Clone, Copy, Debug)]
pub struct SourceText<'a> {
    pub id: &'a ModuleId,
    pub location: &'a ModuleUri,
    pub bytes: &'a [u8],
}

impl SourceText<'_> {
    /// The source as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.bytes).ok()
    }
}

/// Compiles and runs modules on behalf of the resolver.
///
/// Both steps receive the context mutably so they can allocate, root
/// temporaries, and import further modules. Any `GcRef` held on the Rust
/// stack across such a nested import must be rooted with
/// [`Context::root`] first; the nested import may collect.
pub trait ModuleEvaluator {
    /// Compile `source` and allocate its module object.
    ///
    /// The returned object is published in the registry before
    /// [`evaluate`](Self::evaluate) runs, so cyclic imports made from top-level
    /// code observe it.
    fn compile_and_instantiate(
        &self,
        cx: &mut Context,
        source: &SourceText<'_>,
        scope: &ImportScope,
    ) -> Result<GcRef, EvaluationError>;

    /// Run the module's top-level code.
    ///
    /// On error the registry entry is withdrawn and the import fails. The
    /// default does nothing, for evaluators that run everything during
    /// instantiation.
    fn evaluate(
        &self,
        _cx: &mut Context,
        _id: &ModuleId,
        _module: GcRef,
    ) -> Result<(), EvaluationError> {
        Ok(())
    }
}

impl<E: ModuleEvaluator + ?Sized> ModuleEvaluator for Rc<E> {
    fn compile_and_instantiate(
        &self,
        cx: &mut Context,
        source: &SourceText<'_>,
        scope: &ImportScope,
    ) -> Result<GcRef, EvaluationError> {
        (**self).compile_and_instantiate(cx, source, scope)
    }

    fn evaluate(
        &self,
        cx: &mut Context,
        id: &ModuleId,
        module: GcRef,
    ) -> Result<(), EvaluationError> {
        (**self).evaluate(cx, id, module)
    }
}
