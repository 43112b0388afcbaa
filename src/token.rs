/// Half-open byte range `[start, end)` within a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Lexical context a token starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenContext {
    /// Plain code, outside comments and literals.
    #[default]
    Code,
    /// `// ...` up to end of line.
    LineComment,
    /// `/* ... */`.
    BlockComment,
    /// `"..."` or `'...'`.
    StringLiteral,
}

/// One well-formed `${NAME}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub span: Span,
}

/// A path candidate carrying at least one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub span: Span,
    pub text: String,
    /// Ordered by position; never empty.
    pub placeholders: Vec<Placeholder>,
    pub context: TokenContext,
}

/// Scanner output: either a path candidate or a broken placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    Token(RawToken),
    /// `${` without a valid identifier and closing `}`.
    Malformed {
        span: Span,
        text: String,
        context: TokenContext,
    },
}

impl ScanItem {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Token(token) => token.span,
            Self::Malformed { span, .. } => *span,
        }
    }
}
