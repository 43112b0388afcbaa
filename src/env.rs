//! Name to value bindings used during substitution.
//!
//! Bindings usually come from a `CMakeCache.txt` produced by a configured
//! build tree, optionally overridden on the command line.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Error produced while building a `VariableEnv`.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// Name does not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid variable name: {0:?}")]
    InvalidName(String),
    /// `NAME=VALUE` override without `=`.
    #[error("expected NAME=VALUE, got {0:?}")]
    MissingValue(String),
    /// Cache file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Check the identifier grammar shared by bindings and placeholders.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    bytes
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parse a `NAME=VALUE` override into its parts.
///
/// # Errors
///
/// Returns `EnvError::MissingValue` when there is no `=`, and
/// `EnvError::InvalidName` when the name is not an identifier.
pub fn parse_binding(binding: &str) -> Result<(String, String), EnvError> {
    let (name, value) = binding
        .split_once('=')
        .ok_or_else(|| EnvError::MissingValue(binding.to_string()))?;
    if !is_identifier(name) {
        return Err(EnvError::InvalidName(name.to_string()));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Case-sensitive variable bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableEnv {
    vars: HashMap<String, String>,
}

impl VariableEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a binding.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::InvalidName` if `name` is not an identifier.
    pub fn bind(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), EnvError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(EnvError::InvalidName(name));
        }
        self.vars.insert(name, value.into());
        Ok(())
    }

    /// Builder form of [`bind`](Self::bind).
    ///
    /// # Errors
    ///
    /// Returns `EnvError::InvalidName` if `name` is not an identifier.
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, EnvError> {
        self.bind(name, value)?;
        Ok(self)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Total length of all bound values in bytes.
    #[must_use]
    pub fn value_bytes(&self) -> usize {
        self.vars.values().map(String::len).sum()
    }

    /// Bindings sorted by name.
    #[must_use = "iterators are lazy"]
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut entries: Vec<_> = self
            .vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    /// Load bindings from a `CMakeCache.txt`-style file.
    ///
    /// Returns the number of bindings added or replaced.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::Io` if the file cannot be read. Individual bad
    /// lines are skipped, not reported as errors.
    pub fn bootstrap_from_cmake_cache(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<usize, EnvError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| EnvError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let count = self.parse_cmake_cache(&text);
        debug!(path = %path.display(), bindings = count, "loaded cmake cache");
        Ok(count)
    }

    /// Parse cache text of the form `NAME:TYPE=VALUE`, one entry per line.
    ///
    /// `#` and `//` start comment lines. The type is ignored and may be
    /// omitted.
    pub fn parse_cmake_cache(&mut self, text: &str) -> usize {
        let mut count = 0;
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }

            let Some((key, value)) = split_entry(trimmed) else {
                warn!(line = line_no, "skipping cache line without '='");
                continue;
            };

            let name = key.split_once(':').map_or(key, |(name, _ty)| name);
            let name = name
                .strip_prefix('"')
                .and_then(|n| n.strip_suffix('"'))
                .unwrap_or(name);

            if !is_identifier(name) {
                // CMake writes FOO-ADVANCED and similar bookkeeping entries
                debug!(line = line_no, name, "skipping cache entry with non-identifier name");
                continue;
            }

            self.vars.insert(name.to_string(), value.to_string());
            count += 1;
        }
        count
    }
}

/// Split `KEY=VALUE`, honouring a quoted key that may itself contain `=`.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    if let Some(rest) = line.strip_prefix('"') {
        let close = rest.find('"')? + 1;
        let eq = line[close..].find('=')? + close;
        return Some((&line[..eq], &line[eq + 1..]));
    }
    line.split_once('=')
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableEnv {
    /// Collect bindings, logging and dropping invalid names.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Self::new();
        for (k, v) in iter {
            if let Err(e) = env.bind(k, v) {
                warn!("{e}");
            }
        }
        env
    }
}
