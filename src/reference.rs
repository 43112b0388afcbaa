use std::fmt;
use std::path::Path;

use crate::token::{Span, TokenContext};

/// Outcome of resolving one token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    /// Every placeholder substituted and the path normalized.
    Resolved,
    /// The named variable has no binding.
    UnresolvedVariable(String),
    /// `${` not followed by an identifier and `}`.
    MalformedPlaceholder,
    /// Substituted text has no `/`, `\` or `.`.
    NotAPath,
}

impl Status {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Unresolved or malformed: something a user should fix.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::UnresolvedVariable(_) | Self::MalformedPlaceholder)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::UnresolvedVariable(name) => write!(f, "unresolved({name})"),
            Self::MalformedPlaceholder => write!(f, "malformed"),
            Self::NotAPath => write!(f, "not-a-path"),
        }
    }
}

/// Whether a resolved path is rooted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Starts with `/` or a drive prefix like `C:/`.
    Absolute,
    Relative,
}

/// A token after substitution and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub source_span: Span,
    pub raw_text: String,
    /// Normalized path on success, otherwise the partially substituted text.
    pub resolved_path: String,
    pub status: Status,
    /// Set only for `Status::Resolved`.
    pub kind: Option<PathKind>,
    pub context: TokenContext,
}

impl ResolvedReference {
    /// Check the resolved path against the filesystem.
    ///
    /// Relative paths are looked up from the current directory. Always
    /// `false` for references that did not resolve.
    #[must_use]
    pub fn exists_on_disk(&self) -> bool {
        self.status.is_resolved() && Path::new(&self.resolved_path).exists()
    }
}
