//! Variable substitution and textual path normalization.
//!
//! Substitution is single-pass by default: a value that itself contains
//! `${...}` is inserted verbatim and never re-expanded, so the result is
//! a deterministic function of the token and the environment. The
//! opt-in [`Expansion::Recursive`] mode repeats the pass a bounded number
//! of times.
//!
//! Normalization never touches the filesystem.

use tracing::trace;

use crate::env::VariableEnv;
use crate::reference::{PathKind, ResolvedReference, Status};
use crate::scanner::scan;
use crate::token::{Placeholder, RawToken, ScanItem, Span, TokenContext};

/// Recursive expansion stops once the text outgrows this multiple of the
/// token length plus all bound values.
const GROWTH_LIMIT: usize = 4;

/// How substituted values are treated when they contain placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expansion {
    /// Values are inserted verbatim.
    #[default]
    SinglePass,
    /// Re-expand the result up to `fuel` more times, or until the text
    /// grows past a bound proportional to the input.
    Recursive { fuel: usize },
}

/// Turns raw tokens into resolved references against one environment.
#[derive(Debug, Clone, Copy)]
pub struct Substituter<'e> {
    env: &'e VariableEnv,
    expansion: Expansion,
}

impl<'e> Substituter<'e> {
    #[must_use]
    pub const fn new(env: &'e VariableEnv) -> Self {
        Self {
            env,
            expansion: Expansion::SinglePass,
        }
    }

    #[must_use]
    pub const fn expansion(mut self, expansion: Expansion) -> Self {
        self.expansion = expansion;
        self
    }

    /// Substitute, then normalize and classify on full success.
    #[must_use]
    pub fn resolve(&self, token: &RawToken) -> ResolvedReference {
        let mut text = match splice(&token.text, &token.placeholders, token.span.start, self.env) {
            Ok(text) => text,
            Err(Unbound { partial, name }) => {
                return failed(token, partial, Status::UnresolvedVariable(name));
            }
        };

        if let Expansion::Recursive { fuel } = self.expansion {
            let limit = GROWTH_LIMIT * (token.text.len() + self.env.value_bytes());
            for _ in 0..fuel {
                let found = placeholders_in(&text);
                if found.is_empty() {
                    break;
                }
                if text.len() > limit {
                    trace!(raw = %token.text, len = text.len(), limit, "expansion too large");
                    break;
                }
                text = match splice(&text, &found, 0, self.env) {
                    Ok(text) => text,
                    Err(Unbound { partial, name }) => {
                        return failed(token, partial, Status::UnresolvedVariable(name));
                    }
                };
            }
        }

        if text.contains("${") {
            let status = placeholders_in(&text)
                .into_iter()
                .next()
                .map_or(Status::MalformedPlaceholder, |p| {
                    Status::UnresolvedVariable(p.name)
                });
            return failed(token, text, status);
        }

        if !text.contains(['/', '\\', '.']) {
            trace!(raw = %token.text, "not a path");
            return failed(token, text, Status::NotAPath);
        }

        let resolved_path = normalize(&text);
        ResolvedReference {
            source_span: token.span,
            raw_text: token.text.clone(),
            kind: Some(classify(&resolved_path)),
            resolved_path,
            status: Status::Resolved,
            context: token.context,
        }
    }
}

/// Resolve one token with single-pass substitution.
#[must_use]
pub fn substitute(token: &RawToken, env: &VariableEnv) -> ResolvedReference {
    Substituter::new(env).resolve(token)
}

/// Reference for a placeholder the scanner could not parse.
#[must_use]
pub fn malformed(span: Span, text: &str, context: TokenContext) -> ResolvedReference {
    ResolvedReference {
        source_span: span,
        raw_text: text.to_string(),
        resolved_path: text.to_string(),
        status: Status::MalformedPlaceholder,
        kind: None,
        context,
    }
}

fn failed(token: &RawToken, resolved_path: String, status: Status) -> ResolvedReference {
    ResolvedReference {
        source_span: token.span,
        raw_text: token.text.clone(),
        resolved_path,
        status,
        kind: None,
        context: token.context,
    }
}

struct Unbound {
    partial: String,
    name: String,
}

/// Replace `placeholders` (offsets relative to `base`) in `text`.
///
/// Stops at the first unbound name, keeping it and everything after it
/// verbatim.
fn splice(
    text: &str,
    placeholders: &[Placeholder],
    base: usize,
    env: &VariableEnv,
) -> Result<String, Unbound> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for ph in placeholders {
        let start = ph.span.start - base;
        out.push_str(&text[cursor..start]);
        let Some(value) = env.lookup(&ph.name) else {
            out.push_str(&text[start..]);
            return Err(Unbound {
                partial: out,
                name: ph.name.clone(),
            });
        };
        out.push_str(value);
        cursor = ph.span.end - base;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Well-formed placeholders in arbitrary text, in order.
fn placeholders_in(text: &str) -> Vec<Placeholder> {
    scan(text.as_bytes())
        .into_iter()
        .filter_map(|item| match item {
            ScanItem::Token(token) => Some(token.placeholders),
            ScanItem::Malformed { .. } => None,
        })
        .flatten()
        .collect()
}

/// Normalize a path textually.
///
/// Backslashes become `/`, repeated separators collapse (a leading `//`
/// survives), `.` segments vanish and `..` pops its parent. A `..` that
/// would climb above a root is dropped; above a relative start it is kept.
#[must_use]
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let (root, rest) = split_root(&unified);

    let mut segments: Vec<&str> = Vec::new();
    for seg in rest.split('/') {
        match seg {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if !root.is_empty() => {}
                _ => segments.push(".."),
            },
            _ => segments.push(seg),
        }
    }

    if root.is_empty() && segments.is_empty() {
        return ".".to_string();
    }

    let mut out = String::with_capacity(unified.len() + 2);
    out.push_str(root);
    // a relative `X:` first segment must not read as a drive root
    if root.is_empty()
        && is_drive(segments[0])
        && (segments.len() > 1 || rest.ends_with('/'))
    {
        out.push_str("./");
    }
    out.push_str(&segments.join("/"));
    if rest.ends_with('/') && !segments.is_empty() {
        out.push('/');
    }
    out
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Split off `X:/`, `//` or `/`.
fn split_root(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/' {
        return path.split_at(3);
    }
    if path.starts_with("//") && !path.starts_with("///") {
        return path.split_at(2);
    }
    if path.starts_with('/') {
        return ("/", path.trim_start_matches('/'));
    }
    ("", path)
}

#[must_use]
pub fn classify(path: &str) -> PathKind {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'/' | b'\\');
    if drive || path.starts_with('/') {
        PathKind::Absolute
    } else {
        PathKind::Relative
    }
}
