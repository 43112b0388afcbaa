//! Lexical scan for `${VAR}` path tokens.
//!
//! The scanner is language-agnostic: it only knows enough about C-like
//! comments and string literals to report the context a token starts in
//! and to avoid gluing a path onto a comment opener. Buffers are treated
//! as raw bytes, so non-UTF-8 or CJK text around tokens is harmless.

use tracing::trace;

use crate::token::{Placeholder, RawToken, ScanItem, Span, TokenContext};

/// Bytes that may appear in a path run around a placeholder.
#[must_use]
pub const fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b'\\' | b':' | b'+')
}

/// Scan a buffer for path tokens and malformed placeholders.
///
/// Items are returned in ascending span order and never overlap.
/// Scanning never fails; broken placeholders surface as
/// [`ScanItem::Malformed`].
#[must_use]
pub fn scan(input: &[u8]) -> Vec<ScanItem> {
    Scanner::new(input).scan()
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    context: TokenContext,
    /// First byte of the current context's body.
    context_start: usize,
    /// Closing quote of the current string literal.
    quote: u8,
    /// No item may start before this offset.
    floor: usize,
    items: Vec<ScanItem>,
}

impl<'a> Scanner<'a> {
    const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            context: TokenContext::Code,
            context_start: 0,
            quote: b'"',
            floor: 0,
            items: Vec::new(),
        }
    }

    fn scan(mut self) -> Vec<ScanItem> {
        while self.pos < self.input.len() {
            if self.input[self.pos] == b'$' && self.peek_at(1) == Some(b'{') {
                self.scan_placeholder();
            } else {
                self.step();
            }
        }
        self.items
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn enter(&mut self, context: TokenContext, width: usize) {
        self.pos += width;
        self.context = context;
        self.context_start = self.pos;
    }

    /// Advance over one non-placeholder position, tracking context.
    fn step(&mut self) {
        let ch = self.input[self.pos];
        match self.context {
            TokenContext::Code => match (ch, self.peek_at(1)) {
                (b'/', Some(b'/')) => self.enter(TokenContext::LineComment, 2),
                (b'/', Some(b'*')) => self.enter(TokenContext::BlockComment, 2),
                (b'"' | b'\'', _) => {
                    self.quote = ch;
                    self.enter(TokenContext::StringLiteral, 1);
                }
                _ => self.pos += 1,
            },
            TokenContext::LineComment => {
                if ch == b'\n' {
                    self.enter(TokenContext::Code, 1);
                } else {
                    self.pos += 1;
                }
            }
            TokenContext::BlockComment => {
                if ch == b'*' && self.peek_at(1) == Some(b'/') {
                    self.enter(TokenContext::Code, 2);
                } else {
                    self.pos += 1;
                }
            }
            TokenContext::StringLiteral => {
                if ch == b'\\' {
                    // an escape never hides a placeholder's `$`
                    let skip = if self.peek_at(1) == Some(b'$') { 1 } else { 2 };
                    self.pos = (self.pos + skip).min(self.input.len());
                } else if ch == self.quote || ch == b'\n' {
                    self.enter(TokenContext::Code, 1);
                } else {
                    self.pos += 1;
                }
            }
        }
    }

    /// Handle a `${` at the current position.
    fn scan_placeholder(&mut self) {
        let start = self.pos;
        match read_placeholder(self.input, start) {
            Ok(first) => {
                let token = self.extend(first);
                trace!(
                    start = token.span.start,
                    end = token.span.end,
                    placeholders = token.placeholders.len(),
                    "path token"
                );
                let end = token.span.end;
                self.floor = end;
                self.pos = end;
                // a trailing `/` may open a comment with the byte after it
                if self.context == TokenContext::Code
                    && self.input[end - 1] == b'/'
                    && self.input.get(end) == Some(&b'*')
                {
                    self.pos = end - 1;
                }
                self.items.push(ScanItem::Token(token));
            }
            Err(end) => {
                trace!(start, end, "malformed placeholder");
                self.items.push(ScanItem::Malformed {
                    span: Span::new(start, end),
                    text: text_of(self.input, start, end),
                    context: self.context,
                });
                self.floor = self.floor.max(end);
                self.pos = start + 1;
            }
        }
    }

    /// Grow a token around `first` to the maximal surrounding path run.
    fn extend(&self, first: Placeholder) -> RawToken {
        let lower = self.floor.max(self.context_start);
        let mut start = first.span.start;
        while start > lower && is_path_byte(self.input[start - 1]) {
            start -= 1;
        }

        let mut end = first.span.end;
        let mut placeholders = vec![first];
        loop {
            match self.input.get(end) {
                Some(b'$') if self.input.get(end + 1) == Some(&b'{') => {
                    match read_placeholder(self.input, end) {
                        Ok(next) => {
                            end = next.span.end;
                            placeholders.push(next);
                        }
                        // the main loop reports it
                        Err(_) => break,
                    }
                }
                Some(&b) if is_path_byte(b) => end += 1,
                _ => break,
            }
        }

        RawToken {
            span: Span::new(start, end),
            text: text_of(self.input, start, end),
            placeholders,
            context: self.context,
        }
    }
}

/// Read `${NAME}` at `at`, or return the end of the malformed span.
fn read_placeholder(input: &[u8], at: usize) -> Result<Placeholder, usize> {
    let name_start = at + 2;
    let mut i = name_start;
    if input
        .get(i)
        .is_some_and(|&b| b.is_ascii_alphabetic() || b == b'_')
    {
        i += 1;
        while input
            .get(i)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_')
        {
            i += 1;
        }
    }

    if i > name_start && input.get(i) == Some(&b'}') {
        return Ok(Placeholder {
            name: text_of(input, name_start, i),
            span: Span::new(at, i + 1),
        });
    }

    let mut end = name_start;
    while input.get(end).is_some_and(|&b| is_path_byte(b)) {
        end += 1;
    }
    if input.get(end) == Some(&b'}') {
        end += 1;
    }
    Err(end)
}

fn text_of(input: &[u8], start: usize, end: usize) -> String {
    String::from_utf8_lossy(&input[start..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<RawToken> {
        scan(input.as_bytes())
            .into_iter()
            .filter_map(|item| match item {
                ScanItem::Token(t) => Some(t),
                ScanItem::Malformed { .. } => None,
            })
            .collect()
    }

    #[test]
    fn bare_placeholder() {
        let toks = tokens("${PROJECT_ROOT}");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].text, "${PROJECT_ROOT}");
        assert_eq!(toks[0].placeholders[0].name, "PROJECT_ROOT");
    }

    #[test]
    fn path_after_placeholder() {
        let toks = tokens("${PROJECT_ROOT}/config.txt\n");
        assert_eq!(toks[0].span, Span::new(0, 26));
        assert_eq!(toks[0].text, "${PROJECT_ROOT}/config.txt");
    }

    #[test]
    fn leftward_extension() {
        let toks = tokens("x = ../lib/${NAME}.a;");
        assert_eq!(toks[0].text, "../lib/${NAME}.a");
        assert_eq!(toks[0].span.start, 4);
    }

    #[test]
    fn adjacent_placeholders_merge() {
        let toks = tokens("${A}/${B}-x/${C}");
        assert_eq!(toks.len(), 1);
        let names: Vec<_> = toks[0].placeholders.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn terminators_split_tokens() {
        let toks = tokens("<${A}/a>,(${B}/b);${C}/c ${D}/d");
        let texts: Vec<_> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["${A}/a", "${B}/b", "${C}/c", "${D}/d"]);
    }

    #[test]
    fn dollar_without_brace_is_literal() {
        assert!(scan(b"cost $5 and $HOME/x").is_empty());
    }

    #[test]
    fn dollar_ends_token() {
        let toks = tokens("${A}/x$y");
        assert_eq!(toks[0].text, "${A}/x");
    }

    #[test]
    fn missing_close_brace() {
        let items = scan(b"${BAD");
        assert_eq!(
            items,
            vec![ScanItem::Malformed {
                span: Span::new(0, 5),
                text: "${BAD".to_string(),
                context: TokenContext::Code,
            }]
        );
    }

    #[test]
    fn empty_name_is_malformed() {
        let items = scan(b"${}/x");
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], ScanItem::Malformed { text, .. } if text == "${}"));
    }

    #[test]
    fn nested_placeholder() {
        let items = scan(b"${A${B}}");
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], ScanItem::Malformed { span, .. } if *span == Span::new(0, 3)));
        match &items[1] {
            ScanItem::Token(t) => {
                assert_eq!(t.span, Span::new(3, 7));
                assert_eq!(t.placeholders[0].name, "B");
            }
            ScanItem::Malformed { .. } => panic!("expected token"),
        }
    }

    #[test]
    fn malformed_inside_token_ends_it() {
        let items = scan(b"${A}/${B-C}/d");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].span(), Span::new(0, 5));
        assert_eq!(items[1].span(), Span::new(5, 11));
    }

    #[test]
    fn token_after_malformed_does_not_overlap() {
        let items = scan(b"${A-B}/x/${C}/y");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].span(), Span::new(0, 6));
        match &items[1] {
            ScanItem::Token(t) => assert_eq!(t.text, "/x/${C}/y"),
            ScanItem::Malformed { .. } => panic!("expected token"),
        }
    }

    #[test]
    fn contexts() {
        let input = "// ${A}/a\n/* ${B}/b */ \"${C}/c\" ${D}/d";
        let ctx: Vec<_> = tokens(input).iter().map(|t| t.context).collect();
        assert_eq!(
            ctx,
            [
                TokenContext::LineComment,
                TokenContext::BlockComment,
                TokenContext::StringLiteral,
                TokenContext::Code,
            ]
        );
    }

    #[test]
    fn comment_opener_not_absorbed() {
        let toks = tokens("//${A}/x");
        assert_eq!(toks[0].text, "${A}/x");
        assert_eq!(toks[0].context, TokenContext::LineComment);
    }

    #[test]
    fn block_comment_closer_ends_token() {
        let toks = tokens("/*${A}/x*/");
        assert_eq!(toks[0].text, "${A}/x");
    }

    #[test]
    fn comment_opener_after_token_is_seen() {
        let input = "x = ${A}/x/* don't */ ${B}/y";
        let found: Vec<_> = tokens(input)
            .into_iter()
            .map(|t| (t.text, t.context))
            .collect();
        assert_eq!(
            found,
            [
                ("${A}/x/".to_string(), TokenContext::Code),
                ("${B}/y".to_string(), TokenContext::Code),
            ]
        );
    }

    #[test]
    fn token_inside_comment_opened_by_previous_token() {
        let toks = tokens("p = ${A}/x/* see\n ${B}/y */");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1].text, "${B}/y");
        assert_eq!(toks[1].context, TokenContext::BlockComment);
    }

    #[test]
    fn escaped_dollar_in_string() {
        let toks = tokens(r#""\${A}/x""#);
        assert_eq!(toks[0].text, r"\${A}/x");
    }

    #[test]
    fn cjk_comment_bytes() {
        let toks = tokens("// 路径：${SRC_DIR}/main.cpp 示例");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].text, "${SRC_DIR}/main.cpp");
    }
}
