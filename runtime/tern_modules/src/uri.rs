//! Module locations.
//!
//! Locations are URIs (`file:///usr/share/app/main.js`,
//! `resource:///tern/modules/core/gettext.js`). Only the pieces the module
//! loader needs are modelled: the scheme, and for hierarchical URIs
//! (`scheme://authority/path`) the authority and a normalized path.
//! Percent-encoding, queries and fragments are not interpreted.

use std::fmt;
use std::path::{Path, PathBuf};

/// A parsed, normalized module location.
///
/// Parsing lower-cases the scheme and, for hierarchical URIs, collapses
/// `.`, `..` and empty path segments, so two spellings of the same
/// location compare equal and a `..` can never climb out of the root.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct ModuleUri {
    raw: String,
    scheme_len: usize,
    /// Start of the path within `raw`, for hierarchical URIs.
    path_start: Option<usize>,
}

impl ModuleUri {
    /// Parse `input` as a URI. Returns `None` if it has no valid scheme.
    pub fn parse(input: &str) -> Option<ModuleUri> {
        let colon = input.find(':')?;
        let scheme = &input[..colon];
        if !is_valid_scheme(scheme) {
            return None;
        }
        let scheme = scheme.to_ascii_lowercase();
        let rest = &input[colon + 1..];

        match rest.strip_prefix("//") {
            Some(hier) => {
                let (authority, path) = match hier.find('/') {
                    Some(slash) => hier.split_at(slash),
                    None => (hier, "/"),
                };
                Some(Self::hierarchical(&scheme, authority, path))
            }
            None => Some(ModuleUri {
                scheme_len: scheme.len(),
                raw: format!("{scheme}:{rest}"),
                path_start: None,
            }),
        }
    }

    /// `file://` URI for an absolute filesystem path.
    pub fn from_file_path(path: &Path) -> Option<ModuleUri> {
        if !path.is_absolute() {
            return None;
        }
        let path = path.to_str()?.replace('\\', "/");
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Some(Self::hierarchical("file", "", &path))
    }

    fn hierarchical(scheme: &str, authority: &str, path: &str) -> ModuleUri {
        let path = normalize_path(path);
        let raw = format!("{scheme}://{authority}{path}");
        let path_start = raw.len() - path.len();
        ModuleUri {
            raw,
            scheme_len: scheme.len(),
            path_start: Some(path_start),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lower-cased scheme, without the trailing `:`.
    #[inline]
    pub fn scheme(&self) -> &str {
        &self.raw[..self.scheme_len]
    }

    /// Whether this is a `scheme://authority/path` URI.
    #[inline]
    pub fn is_hierarchical(&self) -> bool {
        self.path_start.is_some()
    }

    /// Authority of a hierarchical URI (often empty).
    pub fn authority(&self) -> Option<&str> {
        let start = self.scheme_len + "://".len();
        self.path_start.map(|end| &self.raw[start..end])
    }

    /// Normalized absolute path of a hierarchical URI.
    pub fn path(&self) -> Option<&str> {
        self.path_start.map(|start| &self.raw[start..])
    }

    /// Treat this URI as a directory and append `relative` to it.
    pub fn join(&self, relative: &str) -> Option<ModuleUri> {
        let path = self.path()?;
        let authority = self.authority()?;
        Some(Self::hierarchical(
            self.scheme(),
            authority,
            &format!("{path}/{relative}"),
        ))
    }

    /// Resolve a `./` or `../` specifier against this module's location,
    /// relative to the directory containing it.
    pub fn resolve_relative(&self, relative: &str) -> Option<ModuleUri> {
        let path = self.path()?;
        let authority = self.authority()?;
        let parent = path.rfind('/').map_or("", |slash| &path[..slash]);
        Some(Self::hierarchical(
            self.scheme(),
            authority,
            &format!("{parent}/{relative}"),
        ))
    }

    /// Whether this location is `root` itself or lies beneath it.
    ///
    /// Comparison is segment-wise: `file:///app` contains `file:///app/a.js`
    /// but not `file:///apple.js`.
    pub fn is_within(&self, root: &ModuleUri) -> bool {
        if self.scheme() != root.scheme() || self.authority() != root.authority() {
            return false;
        }
        match (self.path(), root.path()) {
            (Some(path), Some("/")) => path.starts_with('/'),
            (Some(path), Some(root_path)) => path
                .strip_prefix(root_path)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
            (None, None) => self.raw == root.raw,
            _ => false,
        }
    }

    /// Filesystem path of a local `file://` URI.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.scheme() != "file" {
            return None;
        }
        match self.authority()? {
            "" | "localhost" => self.path().map(PathBuf::from),
            _ => None,
        }
    }
}

/// Whether `specifier` is relative to the importing module (`./x`, `../x`).
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// RFC 3986: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Normalize an absolute path by resolving `.`, `..` and empty segments.
///
/// `..` at the root is dropped rather than escaping it.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_owned();
    }
    let mut normalized = String::with_capacity(path.len());
    for segment in segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    normalized
}

impl fmt::Display for ModuleUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for ModuleUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleUri({:?})", self.raw)
    }
}

impl TryFrom<String> for ModuleUri {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ModuleUri::parse(&value).ok_or_else(|| format!("'{value}' is not a URI"))
    }
}

impl From<ModuleUri> for String {
    fn from(uri: ModuleUri) -> String {
        uri.raw
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
