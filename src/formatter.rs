//! Line-oriented serialization of collected references.
//!
//! One record per line: `path:start-end<TAB>status<TAB>resolved`.

use crate::collector::{CollectedReference, SourceBuffer};
use crate::reference::ResolvedReference;

/// Format references collected from `buffers`, one record per line.
///
/// Records whose `buffer_id` has no matching buffer use `?` as the path.
#[must_use]
pub fn format(buffers: &[SourceBuffer<'_>], references: &[CollectedReference]) -> String {
    let mut out = String::new();
    for collected in references {
        let path = buffers.get(collected.buffer_id).map_or("?", |b| b.path);
        format_reference(&mut out, path, &collected.reference);
    }
    out
}

/// Append a single record, including the trailing newline.
pub fn format_reference(out: &mut String, path: &str, reference: &ResolvedReference) {
    out.push_str(path);
    out.push(':');
    out.push_str(&reference.source_span.start.to_string());
    out.push('-');
    out.push_str(&reference.source_span.end.to_string());
    out.push('\t');
    out.push_str(&reference.status.to_string());
    out.push('\t');
    push_escaped(out, &reference.resolved_path);
    out.push('\n');
}

/// Keep one record per line even if a value carries tabs or newlines.
fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
}
