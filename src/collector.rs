//! Drives scanning and substitution across buffers.

use tracing::debug;

use crate::env::VariableEnv;
use crate::reference::{ResolvedReference, Status};
use crate::scanner::scan;
use crate::substitute::{Expansion, Substituter, malformed};
use crate::token::{ScanItem, Span};

/// Borrowed input file: raw bytes plus a path for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceBuffer<'a> {
    pub path: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> SourceBuffer<'a> {
    #[must_use]
    pub const fn new(path: &'a str, bytes: &'a [u8]) -> Self {
        Self { path, bytes }
    }

    #[must_use]
    pub const fn from_text(path: &'a str, text: &'a str) -> Self {
        Self::new(path, text.as_bytes())
    }

    /// Bytes covered by `span`, or `None` if it lies outside the buffer.
    #[must_use]
    pub fn slice(&self, span: Span) -> Option<&'a [u8]> {
        self.bytes.get(span.start..span.end)
    }

    /// 1-based line and byte column of `offset`.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.bytes.len());
        let before = &self.bytes[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        (line, offset - line_start + 1)
    }
}

/// A reference tagged with the index of the buffer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedReference {
    pub buffer_id: usize,
    pub reference: ResolvedReference,
}

/// Reference counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub resolved: usize,
    pub unresolved: usize,
    pub malformed: usize,
}

impl Summary {
    #[must_use]
    pub fn of<'r>(references: impl IntoIterator<Item = &'r ResolvedReference>) -> Self {
        let mut summary = Self::default();
        for r in references {
            match r.status {
                Status::Resolved => summary.resolved += 1,
                Status::UnresolvedVariable(_) => summary.unresolved += 1,
                Status::MalformedPlaceholder => summary.malformed += 1,
                Status::NotAPath => {}
            }
        }
        summary
    }

    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.unresolved > 0 || self.malformed > 0
    }
}

/// Collection settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collector {
    expansion: Expansion,
}

impl Collector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expansion: Expansion::SinglePass,
        }
    }

    #[must_use]
    pub const fn expansion(mut self, expansion: Expansion) -> Self {
        self.expansion = expansion;
        self
    }

    /// References in one buffer, ascending by span start.
    ///
    /// `NotAPath` results are dropped; failures are kept.
    #[must_use]
    pub fn collect_buffer(
        &self,
        buffer: &SourceBuffer<'_>,
        env: &VariableEnv,
    ) -> Vec<ResolvedReference> {
        let substituter = Substituter::new(env).expansion(self.expansion);
        let mut refs: Vec<_> = scan(buffer.bytes)
            .iter()
            .map(|item| match item {
                ScanItem::Token(token) => substituter.resolve(token),
                ScanItem::Malformed {
                    span,
                    text,
                    context,
                } => malformed(*span, text, *context),
            })
            .filter(|r| r.status != Status::NotAPath)
            .collect();

        refs.sort_by_key(|r| r.source_span.start);
        refs.dedup_by_key(|r| r.source_span);

        debug!(path = buffer.path, references = refs.len(), "collected buffer");
        refs
    }

    /// References across `buffers`, ordered by `(buffer_id, span start)`.
    ///
    /// The same resolved path at different spans is reported each time.
    #[must_use]
    pub fn collect(
        &self,
        buffers: &[SourceBuffer<'_>],
        env: &VariableEnv,
    ) -> Vec<CollectedReference> {
        let mut out: Vec<_> = buffers
            .iter()
            .enumerate()
            .flat_map(|(buffer_id, buffer)| {
                self.collect_buffer(buffer, env)
                    .into_iter()
                    .map(move |reference| CollectedReference {
                        buffer_id,
                        reference,
                    })
            })
            .collect();

        out.sort_by_key(|c| (c.buffer_id, c.reference.source_span.start));
        out.dedup_by_key(|c| (c.buffer_id, c.reference.source_span));
        out
    }
}

/// Collect with single-pass substitution.
#[must_use]
pub fn collect(buffers: &[SourceBuffer<'_>], env: &VariableEnv) -> Vec<CollectedReference> {
    Collector::new().collect(buffers, env)
}
