//! Error types for module loading.
//!
//! Every caller-visible failure of an import is an [`ImportError`] whose
//! [`ImportErrorKind`] distinguishes the failure class. Loader-level
//! failures are [`LoadError`] and evaluator diagnostics are
//! [`EvaluationError`]; both are wrapped into an `ImportError` annotated
//! with the identifier and location being imported.

use crate::id::ModuleId;
use crate::uri::ModuleUri;
use std::fmt;
use std::sync::Arc;

/// Structured failure class of an import.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImportErrorKind {
    /// Empty or malformed identifier/specifier. Detected before any I/O.
    InvalidIdentifier,
    /// The location lies outside the allowed module roots. Detected before
    /// any I/O.
    PermissionDenied,
    /// The source could not be read. Never cached; retry is safe.
    LoadFailure,
    /// Compilation, instantiation or top-level evaluation failed. Never
    /// cached; retry is safe.
    EvaluationFailure,
    /// A bare specifier was not found on the module search path.
    ModuleNotFound,
}

impl ImportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "invalid identifier",
            Self::PermissionDenied => "permission denied",
            Self::LoadFailure => "load failure",
            Self::EvaluationFailure => "evaluation failure",
            Self::ModuleNotFound => "module not found",
        }
    }
}

impl fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by an import.
#[derive(Debug, Clone)]
pub struct ImportError {
    /// Structured error kind for programmatic matching.
    pub kind: ImportErrorKind,
    /// Human-readable error message with context.
    pub message: String,
    /// The identifier or specifier that was requested (may be empty).
    pub id: String,
    /// The resolved source location, when resolution got that far.
    pub location: Option<String>,
    source: Option<Arc<LoadError>>,
}

impl ImportError {
    #[cold]
    pub fn invalid_identifier(id: &str, reason: &str) -> Self {
        ImportError {
            kind: ImportErrorKind::InvalidIdentifier,
            message: format!("invalid module identifier '{id}': {reason}"),
            id: id.to_owned(),
            location: None,
            source: None,
        }
    }

    #[cold]
    pub fn permission_denied(id: &str, location: &ModuleUri) -> Self {
        ImportError {
            kind: ImportErrorKind::PermissionDenied,
            message: format!(
                "module '{id}' resolves to '{location}', outside the allowed module roots"
            ),
            id: id.to_owned(),
            location: Some(location.to_string()),
            source: None,
        }
    }

    #[cold]
    pub fn load_failure(id: &ModuleId, location: &ModuleUri, error: LoadError) -> Self {
        ImportError {
            kind: ImportErrorKind::LoadFailure,
            message: format!("unable to load module '{id}' from '{location}': {error}"),
            id: id.to_string(),
            location: Some(location.to_string()),
            source: Some(Arc::new(error)),
        }
    }

    #[cold]
    pub fn evaluation_failure(
        id: &ModuleId,
        location: &ModuleUri,
        error: &EvaluationError,
    ) -> Self {
        ImportError {
            kind: ImportErrorKind::EvaluationFailure,
            message: format!("failed to evaluate module '{id}': {error}"),
            id: id.to_string(),
            location: Some(location.to_string()),
            source: None,
        }
    }

    #[cold]
    pub fn module_not_found(specifier: &str, searched: &[ModuleUri]) -> Self {
        let searched = searched
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        ImportError {
            kind: ImportErrorKind::ModuleNotFound,
            message: format!(
                "attempted to load unregistered global module '{specifier}'. Searched: {searched}"
            ),
            id: specifier.to_owned(),
            location: None,
            source: None,
        }
    }

    /// The loader error behind a `LoadFailure`, if any.
    pub fn load_error(&self) -> Option<&LoadError> {
        self.source.as_deref()
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Failure reported by a [`SourceLoader`](crate::SourceLoader).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no such resource: {0}")]
    NotFound(String),

    #[error("permission denied reading {0}")]
    PermissionDenied(String),

    #[error("I/O error reading {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no loader registered for URI scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },
}

impl LoadError {
    /// Classify an I/O error raised while reading `location`.
    pub fn from_io(location: &ModuleUri, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(location.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                LoadError::PermissionDenied(location.to_string())
            }
            _ => LoadError::Io {
                location: location.to_string(),
                source: error,
            },
        }
    }
}

/// Diagnostic from a [`ModuleEvaluator`](crate::ModuleEvaluator): syntax
/// errors, link errors, or exceptions thrown by top-level code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationError {
    pub message: String,
}

impl EvaluationError {
    #[cold]
    pub fn new(message: impl Into<String>) -> Self {
        EvaluationError {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvaluationError {}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
