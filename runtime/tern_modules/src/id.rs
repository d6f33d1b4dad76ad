//! Module identifiers.

use crate::errors::ImportError;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Immutable name of a module within one runtime context.
///
/// Hashing and equality are over the exact bytes of the string; no case
/// folding or path normalization happens here. Identifiers are plain data,
/// never heap objects, so a collection can never change their hash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    /// Validate and wrap an identifier.
    ///
    /// Rejects the empty string and identifiers containing NUL.
    pub fn new(id: &str) -> Result<Self, ImportError> {
        if id.is_empty() {
            return Err(ImportError::invalid_identifier(id, "identifier is empty"));
        }
        if id.contains('\0') {
            return Err(ImportError::invalid_identifier(
                id,
                "identifier contains a NUL character",
            ));
        }
        Ok(ModuleId(Arc::from(id)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModuleId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({:?})", &*self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
