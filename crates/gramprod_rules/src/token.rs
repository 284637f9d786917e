//! Tokens and source spans for the rule mini-language.

/// A span of rule text.
///
/// Tracks byte offsets and line/column positions for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset where this span starts.
    pub start: usize,
    /// Byte offset where this span ends (exclusive).
    pub end: usize,
    /// 1-based line number where this span starts.
    pub line: u32,
    /// 1-based column number where this span starts.
    pub column: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Returns the text this span covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// A token of rule text.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token types of the rule mini-language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `(` opening a group
    LParen,
    /// `)`
    RParen,
    /// `[` opening a qualifier
    LBracket,
    /// `]`
    RBracket,
    /// `<` opening a part-of-speech list
    LAngle,
    /// `>`
    RAngle,
    /// `|` separating alternatives
    Pipe,
    /// `->` binding a slot
    Arrow,
    /// `*` matching the rest of the input
    Star,
    /// Quoted literal word, quotes removed
    Literal(String),
    /// Bare name
    Symbol(String),
    /// Integer, used by qualifiers
    Int(i64),
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LAngle => "'<'",
            Self::RAngle => "'>'",
            Self::Pipe => "'|'",
            Self::Arrow => "'->'",
            Self::Star => "'*'",
            Self::Literal(_) => "literal",
            Self::Symbol(_) => "symbol",
            Self::Int(_) => "integer",
            Self::Eof => "end of rule",
            Self::Error(_) => "error",
        }
    }
}
