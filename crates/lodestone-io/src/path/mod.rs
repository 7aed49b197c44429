//! Logical paths and URIs.

mod normalize;
mod uri;

pub use normalize::{
    contains_null_byte, contains_traversal, extension, file_name, is_absolute_like,
    is_absolute_path_like, is_slash, join, join_root_and_relative, normalize, normalize_slashes,
    parent, remove_dot_segments, replace_extension, strip_scheme_loose, NormalizeOptions,
};
pub use uri::{Uri, UriScheme};

use std::fmt;

use crate::error::IoResult;

/// A normalized, "/"-separated logical path.
///
/// Construct via [`LogicalPath::parse`] for untrusted input or
/// [`LogicalPath::from_normalized`] for strings that are already normal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LogicalPath {
    normalized: String,
}

impl LogicalPath {
    /// Wrap an already-normalized string. Trusted input only.
    pub fn from_normalized(normalized: impl Into<String>) -> Self {
        Self {
            normalized: normalized.into(),
        }
    }

    /// Normalize raw input according to `opt`.
    pub fn parse(raw: &str, opt: &NormalizeOptions) -> IoResult<Self> {
        Ok(Self::from_normalized(normalize(raw, opt)?))
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn is_absolute_like(&self) -> bool {
        is_absolute_like(&self.normalized)
    }

    pub fn has_traversal(&self) -> bool {
        contains_traversal(&self.normalized)
    }

    pub fn file_name(&self) -> &str {
        file_name(&self.normalized)
    }

    pub fn extension(&self) -> &str {
        extension(&self.normalized)
    }

    pub fn parent(&self) -> LogicalPath {
        LogicalPath::from_normalized(parent(&self.normalized))
    }

    /// Join with a relative path; both sides are expected to be normalized.
    pub fn join(&self, relative: &LogicalPath) -> LogicalPath {
        LogicalPath::from_normalized(join(&self.normalized, &relative.normalized))
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl AsRef<str> for LogicalPath {
    fn as_ref(&self) -> &str {
        &self.normalized
    }
}
