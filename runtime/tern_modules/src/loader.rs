//! Source loaders.
//!
//! A [`SourceLoader`] turns a location into raw bytes. The resolver never
//! interprets the bytes; that is the evaluator's job.
//!
//! ## Built-in loaders
//!
//! - [`FileLoader`]: `file://` URIs from the local filesystem
//! - [`ResourceLoader`]: `resource://` URIs from an in-memory
//!   [`ResourceBundle`] registered by the embedder
//! - [`SchemeLoaders`]: routes each location to the loader registered for
//!   its scheme

use crate::errors::LoadError;
use crate::uri::ModuleUri;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::rc::Rc;
use std::sync::Arc;

/// Reads module source bytes.
pub trait SourceLoader {
    /// Read the complete source at `location`.
    fn read_source(&self, location: &ModuleUri) -> Result<Vec<u8>, LoadError>;

    /// Whether `location` names an existing source.
    ///
    /// Used to probe search-path candidates. The default attempts a read.
    fn exists(&self, location: &ModuleUri) -> bool {
        self.read_source(location).is_ok()
    }
}

impl<L: SourceLoader + ?Sized> SourceLoader for Rc<L> {
    fn read_source(&self, location: &ModuleUri) -> Result<Vec<u8>, LoadError> {
        (**self).read_source(location)
    }

    fn exists(&self, location: &ModuleUri) -> bool {
        (**self).exists(location)
    }
}

impl<L: SourceLoader + ?Sized> SourceLoader for Box<L> {
    fn read_source(&self, location: &ModuleUri) -> Result<Vec<u8>, LoadError> {
        (**self).read_source(location)
    }

    fn exists(&self, location: &ModuleUri) -> bool {
        (**self).exists(location)
    }
}

/// Loads `file://` URIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl SourceLoader for FileLoader {
    fn read_source(&self, location: &ModuleUri) -> Result<Vec<u8>, LoadError> {
        let path = location
            .to_file_path()
            .ok_or_else(|| LoadError::InvalidLocation {
                location: location.to_string(),
                reason: "not a local file URI".to_owned(),
            })?;
        tracing::trace!(path = %path.display(), "reading module file");
        std::fs::read(&path).map_err(|e| LoadError::from_io(location, e))
    }

    fn exists(&self, location: &ModuleUri) -> bool {
        location.to_file_path().is_some_and(|path| path.is_file())
    }
}

/// Embedded module sources, keyed by absolute resource path.
///
/// Cheap to clone and shareable across threads, so an embedder can
/// register its bundled modules once and hand the bundle to every
/// context it creates.
#[derive(Debug, Default, Clone)]
pub struct ResourceBundle {
    resources: Arc<RwLock<FxHashMap<String, Arc<[u8]>>>>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` at `path` (e.g. `/tern/modules/core/gettext.js`),
    /// replacing any previous resource there.
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        let key = resource_key(path);
        let bytes: Arc<[u8]> = bytes.into().into();
        self.resources.write().insert(key, bytes);
    }

    pub fn get(&self, path: &str) -> Option<Arc<[u8]>> {
        self.resources.read().get(&resource_key(path)).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resources.read().contains_key(&resource_key(path))
    }

    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }
}

/// Resource paths are stored in the same normalized form `ModuleUri`
/// produces, so `a//b/./c.js` and `/a/b/c.js` name the same resource.
fn resource_key(path: &str) -> String {
    ModuleUri::parse(&format!("resource://{}", with_leading_slash(path)))
        .and_then(|uri| uri.path().map(str::to_owned))
        .unwrap_or_else(|| path.to_owned())
}

fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Loads `resource://` URIs from a [`ResourceBundle`].
#[derive(Debug, Default, Clone)]
pub struct ResourceLoader {
    bundle: ResourceBundle,
}

impl ResourceLoader {
    pub fn new(bundle: ResourceBundle) -> Self {
        ResourceLoader { bundle }
    }

    pub fn bundle(&self) -> &ResourceBundle {
        &self.bundle
    }
}

impl SourceLoader for ResourceLoader {
    fn read_source(&self, location: &ModuleUri) -> Result<Vec<u8>, LoadError> {
        let path = location.path().ok_or_else(|| LoadError::InvalidLocation {
            location: location.to_string(),
            reason: "resource URIs must be hierarchical".to_owned(),
        })?;
        self.bundle
            .get(path)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| LoadError::NotFound(location.to_string()))
    }

    fn exists(&self, location: &ModuleUri) -> bool {
        location.path().is_some_and(|path| self.bundle.contains(path))
    }
}

/// Dispatches each location to the loader registered for its scheme.
#[derive(Default)]
pub struct SchemeLoaders {
    loaders: FxHashMap<String, Box<dyn SourceLoader>>,
}

impl SchemeLoaders {
    /// An empty router; every location fails with `UnsupportedScheme`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the built-in `file` and `resource` loaders.
    pub fn with_defaults(bundle: ResourceBundle) -> Self {
        let mut loaders = Self::new();
        loaders
            .register("file", FileLoader)
            .register("resource", ResourceLoader::new(bundle));
        loaders
    }

    /// Register `loader` for `scheme`, replacing any previous one.
    pub fn register(
        &mut self,
        scheme: &str,
        loader: impl SourceLoader + 'static,
    ) -> &mut Self {
        self.loaders
            .insert(scheme.to_ascii_lowercase(), Box::new(loader));
        self
    }

    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.loaders.contains_key(&scheme.to_ascii_lowercase())
    }
}

impl SourceLoader for SchemeLoaders {
    fn read_source(&self, location: &ModuleUri) -> Result<Vec<u8>, LoadError> {
        match self.loaders.get(location.scheme()) {
            Some(loader) => loader.read_source(location),
            None => Err(LoadError::UnsupportedScheme(location.scheme().to_owned())),
        }
    }

    fn exists(&self, location: &ModuleUri) -> bool {
        self.loaders
            .get(location.scheme())
            .is_some_and(|loader| loader.exists(location))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
