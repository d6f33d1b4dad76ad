//! Runtime configuration.
//!
//! `RuntimeConfig::default()` gives the built-in search path and no
//! location restrictions. `RuntimeConfig::from_env()` layers environment
//! overrides on top:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TERN_MODULE_PATH` | directories (platform path-list syntax) searched for bare specifiers before the built-in roots |
//! | `TERN_ALLOWED_ROOTS` | directories (platform path-list syntax) modules may be loaded from |
//! | `TERN_GC_STRESS` | any value but `0` collects at every safepoint |

use crate::uri::ModuleUri;
use tern_heap::HeapConfig;

/// Built-in roots probed for bare specifiers, in order.
pub const DEFAULT_SEARCH_PATH: &[&str] = &[
    "resource:///tern/modules/esm/",
    "resource:///tern/modules/core/",
];

/// Schemes whose hierarchical URIs anchor relative specifiers by default.
pub const DEFAULT_RELATIVE_SCHEMES: &[&str] = &["file", "resource"];

/// Configuration for a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuntimeConfig {
    /// Collector configuration for the context's heap.
    pub heap: HeapConfig,

    /// Roots that module locations must lie within.
    ///
    /// Empty means unrestricted. When non-empty, the search-path roots are
    /// implicitly allowed as well.
    ///
    /// Default: empty
    pub allowed_roots: Vec<ModuleUri>,

    /// Roots probed, in order, for bare specifiers such as `gettext`.
    ///
    /// Default: [`DEFAULT_SEARCH_PATH`]
    pub search_path: Vec<ModuleUri>,

    /// Schemes whose modules may import `./` and `../` specifiers.
    ///
    /// An embedder that registers a hierarchical scheme of its own adds it
    /// here so modules loaded through it can use relative imports.
    ///
    /// Default: [`DEFAULT_RELATIVE_SCHEMES`]
    pub relative_schemes: Vec<String>,

    /// Maximum nesting of imports issued from within other imports.
    ///
    /// Default: 512
    pub max_import_depth: usize,
}

impl RuntimeConfig {
    /// Default maximum import nesting.
    pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 512;

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Default configuration with overrides read through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = RuntimeConfig::default();

        if let Some(value) = var("TERN_MODULE_PATH") {
            let mut search_path = directory_uris("TERN_MODULE_PATH", &value);
            search_path.append(&mut config.search_path);
            config.search_path = search_path;
        }

        if let Some(value) = var("TERN_ALLOWED_ROOTS") {
            config
                .allowed_roots
                .extend(directory_uris("TERN_ALLOWED_ROOTS", &value));
        }

        if let Some(value) = var("TERN_GC_STRESS") {
            config.heap.stress = value.trim() != "0";
        }

        tracing::debug!(
            search_path = config.search_path.len(),
            allowed_roots = config.allowed_roots.len(),
            stress = config.heap.stress,
            "runtime configuration loaded"
        );
        config
    }

    /// Whether `location` may be loaded under this configuration.
    pub fn permits(&self, location: &ModuleUri) -> bool {
        self.allowed_roots.is_empty()
            || self
                .allowed_roots
                .iter()
                .chain(&self.search_path)
                .any(|root| location.is_within(root))
    }

    /// Whether modules at `scheme` locations may use relative specifiers.
    pub fn resolves_relative(&self, scheme: &str) -> bool {
        self.relative_schemes
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            heap: HeapConfig::default(),
            allowed_roots: Vec::new(),
            search_path: DEFAULT_SEARCH_PATH
                .iter()
                .filter_map(|root| ModuleUri::parse(root))
                .collect(),
            relative_schemes: DEFAULT_RELATIVE_SCHEMES
                .iter()
                .map(|scheme| (*scheme).to_owned())
                .collect(),
            max_import_depth: Self::DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

/// Split a path list and turn each absolute directory into a `file://` URI.
fn directory_uris(variable: &str, value: &str) -> Vec<ModuleUri> {
    std::env::split_paths(value)
        .filter(|path| !path.as_os_str().is_empty())
        .filter_map(|path| {
            let uri = ModuleUri::from_file_path(&path);
            if uri.is_none() {
                tracing::warn!(
                    variable,
                    path = %path.display(),
                    "ignoring entry that is not an absolute directory"
                );
            }
            uri
        })
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
