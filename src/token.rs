use std::fmt;

/// Source location for error reporting.
///
/// `offset` is a byte offset into the original text; `line` and
/// `column` are 1-based, with columns counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Numeric literal forms recognised by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    /// `0`, `42`, `1_000`.
    Decimal,
    /// `0x1F`.
    Hex,
    /// `0o755`.
    Octal,
    /// `0b1010`.
    Binary,
    /// `3.14`, `1.`, `2.5e-3`.
    PointFloat,
    /// `1e10`.
    ExponentFloat,
    /// `3j`, `2.5j`.
    Imaginary,
}

impl NumberKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Hex => "hex",
            Self::Octal => "octal",
            Self::Binary => "binary",
            Self::PointFloat => "point-float",
            Self::ExponentFloat => "exponent-float",
            Self::Imaginary => "imaginary",
        }
    }
}

/// Token kinds produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Plain decimal digit run.
    Integer,
    /// Any other numeric literal.
    Number(NumberKind),
    /// Identifier.
    Identifier,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `:=`
    Assign,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// Identifier immediately followed by `(`.
    Function,
    /// `!=`
    NotEqual,
}

impl TokenKind {
    /// Upper-case tag used in token listings.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Number(_) => "NUMBER",
            Self::Identifier => "ID",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Star => "MUL",
            Self::Slash => "DIV",
            Self::LeftParen => "LPAREN",
            Self::RightParen => "RPAREN",
            Self::Assign => "ASSIGN",
            Self::Semicolon => "SEMICOLON",
            Self::Colon => "COLON",
            Self::Comma => "COMMA",
            Self::Function => "FUNCTION",
            Self::NotEqual => "NOT_EQUAL",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(kind) => write!(f, "NUMBER({})", kind.name()),
            other => f.write_str(other.tag()),
        }
    }
}

/// A single token with its kind, exact text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}
