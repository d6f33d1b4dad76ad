//! Tern Modules - module registry and import resolution.
//!
//! Each [`Context`] caches at most one module object per identifier. The
//! cache holds collector-visible references: it is a root of the context's
//! [`tern_heap::Heap`] and its entries are rewritten in place whenever a
//! collection relocates them.
//!
//! # Architecture
//!
//! ```text
//! Context::import_specifier("./utils.js")
//!   └── resolve against the importer's location, or the search path
//!         └── Context::import(id, scope, location)
//!               ├── ModuleRegistry::lookup      (hit: done)
//!               ├── SourceLoader::read_source   (file://, resource://, ...)
//!               ├── ModuleEvaluator::compile_and_instantiate
//!               ├── ModuleRegistry::insert      (published)
//!               └── ModuleEvaluator::evaluate   (failure withdraws the entry)
//! ```
//!
//! # Tracing
//!
//! Import and collection events are emitted with `tracing`. Call
//! [`init_tracing`] and set `RUST_LOG=tern_modules=debug` to see them.

mod config;
mod context;
mod errors;
mod evaluator;
mod id;
mod loader;
mod object;
mod registry;
mod stack;
mod uri;

pub use config::{RuntimeConfig, DEFAULT_RELATIVE_SCHEMES, DEFAULT_SEARCH_PATH};
pub use context::{Context, ContextBuilder};
pub use errors::{EvaluationError, ImportError, ImportErrorKind, LoadError};
pub use evaluator::{ImportScope, ModuleEvaluator, SourceText};
pub use id::ModuleId;
pub use loader::{FileLoader, ResourceBundle, ResourceLoader, SchemeLoaders, SourceLoader};
pub use object::{HeapObject, ModuleObject, Record, Value};
pub use registry::{ModuleRegistry, RegistryInvariantViolation};
pub use uri::{is_relative_specifier, ModuleUri};

pub use tern_heap::{CollectionStats, GcRef, Handle, HeapConfig, HeapStats};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, and only the first call has any
/// effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
