//! Import resolution.
//!
//! # Algorithm
//!
//! [`Context::import`] caches one module object per identifier:
//!
//! 1. validate the identifier and check the location against the allowed
//!    roots, before touching the registry or the loader
//! 2. registry hit: return it
//! 3. miss: read the source, then run a collector safepoint
//! 4. compile and instantiate; nothing is cached if this fails
//! 5. publish, unless a re-entrant import published the same identifier
//!    first, in which case that object wins and ours is garbage
//! 6. evaluate top-level code; on failure the entry is withdrawn
//! 7. return the reference, re-read from the registry since evaluation may
//!    have collected
//!
//! [`Context::import_specifier`] maps an import specifier (relative path,
//! absolute URI or bare name) to an identifier and location first.

use super::Context;
use crate::errors::{EvaluationError, ImportError};
use crate::evaluator::{ImportScope, SourceText};
use crate::id::ModuleId;
use crate::object::ModuleObject;
use crate::registry::ModuleRegistry;
use crate::stack::ensure_sufficient_stack;
use crate::uri::{is_relative_specifier, ModuleUri};
use std::rc::Rc;
use tern_heap::GcRef;
use tracing::{debug, trace};

/// Extension appended to bare specifiers when probing the search path.
const MODULE_EXTENSION: &str = ".js";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RegistryKind {
    Modules,
    Internal,
}

impl Context {
    /// Import the module `id` from `location`, or return the cached object.
    ///
    /// The returned reference is current until the next safepoint. Callers
    /// that hold it across another import must root it.
    #[tracing::instrument(level = "debug", skip_all, fields(id = id, location = %location))]
    pub fn import(
        &mut self,
        id: &str,
        scope: &ImportScope,
        location: &ModuleUri,
    ) -> Result<GcRef, ImportError> {
        self.import_into(RegistryKind::Modules, id, scope, location)
    }

    /// Resolve `specifier` as seen from `scope` and import it.
    ///
    /// - `./x.js`, `../x.js`: relative to the importer's location
    /// - `file:///x.js`, `resource:///x.js`: imported under the normalized URI
    /// - `gettext`: found on the search path and cached in the internal
    ///   registry under the bare name
    #[tracing::instrument(level = "debug", skip_all, fields(specifier = specifier))]
    pub fn import_specifier(
        &mut self,
        specifier: &str,
        scope: &ImportScope,
    ) -> Result<GcRef, ImportError> {
        if specifier.is_empty() {
            return Err(ImportError::invalid_identifier(
                specifier,
                "specifier is empty",
            ));
        }

        if let Some(object) = self
            .modules
            .lookup(specifier)
            .or_else(|| self.internal_modules.lookup(specifier))
        {
            trace!("specifier already registered");
            return Ok(object);
        }

        if is_relative_specifier(specifier) {
            let base = self.importer_location(specifier, scope)?;
            let location = base.resolve_relative(specifier).ok_or_else(|| {
                ImportError::invalid_identifier(specifier, "cannot resolve relative path")
            })?;
            return self.import(location.as_str(), scope, &location);
        }

        if let Some(location) = ModuleUri::parse(specifier) {
            return self.import(location.as_str(), scope, &location);
        }

        self.import_bare(specifier, scope)
    }

    fn import_bare(
        &mut self,
        specifier: &str,
        scope: &ImportScope,
    ) -> Result<GcRef, ImportError> {
        let id = ModuleId::new(specifier)?;
        let file_name = format!("{specifier}{MODULE_EXTENSION}");
        let candidates: Vec<ModuleUri> = self
            .config
            .search_path
            .iter()
            .filter_map(|root| root.join(&file_name))
            .collect();

        // Every candidate is checked before the first probe.
        if let Some(denied) = candidates.iter().find(|c| !self.config.permits(c)) {
            debug!(candidate = %denied, "search candidate outside the allowed roots");
            return Err(ImportError::permission_denied(id.as_str(), denied));
        }

        let Some(location) = candidates
            .iter()
            .find(|candidate| self.loader.exists(candidate))
            .cloned()
        else {
            debug!(candidates = candidates.len(), "not found on search path");
            return Err(ImportError::module_not_found(specifier, &candidates));
        };

        debug!(location = %location, "found on search path");
        self.import_into(RegistryKind::Internal, id.as_str(), scope, &location)
    }

    /// Location relative specifiers from `scope` resolve against.
    fn importer_location(
        &self,
        specifier: &str,
        scope: &ImportScope,
    ) -> Result<ModuleUri, ImportError> {
        let location = scope.location().cloned().or_else(|| {
            let importer = scope.importer()?;
            let object = self
                .modules
                .lookup(importer.as_str())
                .or_else(|| self.internal_modules.lookup(importer.as_str()))?;
            self.module(object).and_then(ModuleObject::uri).cloned()
        });

        let Some(location) = location else {
            return Err(ImportError::invalid_identifier(
                specifier,
                "cannot import from relative path when module path is unknown",
            ));
        };
        if !location.is_hierarchical() || !self.config.resolves_relative(location.scheme()) {
            return Err(ImportError::invalid_identifier(
                specifier,
                &format!(
                    "relative imports are not supported from '{}' modules",
                    location.scheme()
                ),
            ));
        }
        Ok(location)
    }

    fn import_into(
        &mut self,
        kind: RegistryKind,
        id: &str,
        scope: &ImportScope,
        location: &ModuleUri,
    ) -> Result<GcRef, ImportError> {
        let id = ModuleId::new(id)?;
        if !self.config.permits(location) {
            debug!("location outside the allowed roots");
            return Err(ImportError::permission_denied(id.as_str(), location));
        }

        if let Some(object) = self.registry_of(kind).lookup(id.as_str()) {
            trace!(object = %object, "cache hit");
            return Ok(object);
        }

        let limit = self.config.max_import_depth;
        if self.import_stack.len() >= limit {
            debug!(limit, "import nesting limit reached");
            return Err(ImportError::evaluation_failure(
                &id,
                location,
                &EvaluationError::new(format!(
                    "import nesting exceeds the limit of {limit} (cyclic import?)"
                )),
            ));
        }

        self.import_stack.push(id.clone());
        let result =
            ensure_sufficient_stack(|| self.load_and_publish(kind, &id, scope, location));
        self.import_stack.pop();
        result
    }

    fn load_and_publish(
        &mut self,
        kind: RegistryKind,
        id: &ModuleId,
        scope: &ImportScope,
        location: &ModuleUri,
    ) -> Result<GcRef, ImportError> {
        debug!("cache miss");
        let bytes = self.loader.read_source(location).map_err(|error| {
            debug!(error = %error, "load failed");
            ImportError::load_failure(id, location, error)
        })?;
        self.safepoint();

        let evaluator = Rc::clone(&self.evaluator);
        let source = SourceText {
            id,
            location,
            bytes: &bytes,
        };
        let object = evaluator
            .compile_and_instantiate(self, &source, scope)
            .map_err(|error| {
                debug!(error = %error, "instantiation failed");
                ImportError::evaluation_failure(id, location, &error)
            })?;

        if !self.heap.contains(object) {
            debug!(object = %object, "instantiation returned a stale reference");
            return Err(ImportError::evaluation_failure(
                id,
                location,
                &EvaluationError::new(
                    "instantiation returned a module reference that did not survive collection",
                ),
            ));
        }

        if let Some(existing) = self.registry_of(kind).lookup(id.as_str()) {
            debug!(existing = %existing, "re-entrant import published first, discarding instance");
            return Ok(existing);
        }
        self.registry_of_mut(kind).insert(id.clone(), object);
        debug!(object = %object, "published");

        if let Err(error) = evaluator.evaluate(self, id, object) {
            self.registry_of_mut(kind).withdraw(id.as_str());
            debug!(error = %error, "evaluation failed, entry withdrawn");
            return Err(ImportError::evaluation_failure(id, location, &error));
        }

        match self.registry_of(kind).lookup(id.as_str()) {
            Some(object) => Ok(object),
            None => unreachable!("published module '{id}' vanished during evaluation"),
        }
    }

    fn registry_of(&self, kind: RegistryKind) -> &ModuleRegistry {
        match kind {
            RegistryKind::Modules => &self.modules,
            RegistryKind::Internal => &self.internal_modules,
        }
    }

    fn registry_of_mut(&mut self, kind: RegistryKind) -> &mut ModuleRegistry {
        match kind {
            RegistryKind::Modules => &mut self.modules,
            RegistryKind::Internal => &mut self.internal_modules,
        }
    }
}
