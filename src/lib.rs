//! Scanner and resolver for CMake-style `${VAR}` path tokens.
//!
//! Finds path-like runs containing `${NAME}` placeholders in arbitrary
//! source text, substitutes them from a variable environment (usually a
//! `CMakeCache.txt`), normalizes the result textually, and reports every
//! occurrence with its byte span so an editor can turn it into a link.
//!
//! # Quick start
//!
//! ```
//! use cmake_path_resolver::{SourceBuffer, Status, VariableEnv, collect};
//!
//! let mut env = VariableEnv::new();
//! env.bind("INCLUDE_DIR", "/opt/inc").unwrap();
//!
//! let buffer = SourceBuffer::from_text("main.c", "#include \"${INCLUDE_DIR}/utils.h\"\n");
//! let refs = collect(&[buffer], &env);
//!
//! assert_eq!(refs.len(), 1);
//! assert_eq!(refs[0].reference.resolved_path, "/opt/inc/utils.h");
//! assert_eq!(refs[0].reference.status, Status::Resolved);
//! ```
//!
//! # Substitution contract
//!
//! Substitution is single-pass: a value containing `${...}` is inserted
//! as-is and the reference is reported unresolved. Use
//! [`Expansion::Recursive`] with an explicit fuel bound to opt into
//! repeated expansion.

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod collector;
pub mod env;
pub mod formatter;
pub mod reference;
pub mod scanner;
pub mod substitute;
pub mod token;

pub use collector::{CollectedReference, Collector, SourceBuffer, Summary, collect};
pub use env::{EnvError, VariableEnv, is_identifier, parse_binding};
pub use formatter::format;
pub use reference::{PathKind, ResolvedReference, Status};
pub use scanner::scan;
pub use substitute::{Expansion, Substituter, classify, normalize, substitute};
pub use token::{Placeholder, RawToken, ScanItem, Span, TokenContext};

/// Unified error type for the fallible parts of the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Environment construction failed.
    #[error("{0}")]
    Env(#[from] EnvError),
    /// An input file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve every reference in a single string.
#[must_use]
pub fn resolve_str(input: &str, env: &VariableEnv) -> Vec<ResolvedReference> {
    Collector::new().collect_buffer(&SourceBuffer::from_text("<input>", input), env)
}

/// Read `path` and resolve its references.
pub fn resolve_file(
    path: impl AsRef<std::path::Path>,
    env: &VariableEnv,
) -> Result<Vec<ResolvedReference>, Error> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let display = path.to_string_lossy();
    Ok(Collector::new().collect_buffer(&SourceBuffer::new(&display, &bytes), env))
}
