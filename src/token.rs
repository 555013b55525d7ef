use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// Arithmetic and comparison operators accepted inside `Math(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `+` (integer addition, string concatenation).
    Plus,
    /// `-` (integer subtraction).
    Minus,
    /// `*` (integer multiplication).
    Star,
    /// `/` (truncating integer division).
    Slash,
    /// `==` (same-kind equality).
    EqEq,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::EqEq => "==",
        };
        f.write_str(s)
    }
}

/// Token kinds produced by the lexer.
///
/// Whitespace and comments never become tokens; the lexer discards
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (`Set`, `DisplayText`, `USER`, ...).
    Word,
    /// Base-10 integer literal, already parsed.
    Integer(i64),
    /// Double-quoted string with escapes resolved.
    QuotedString,
    /// Operator (`+ - * / ==`).
    Operator(Operator),
    /// Opening parenthesis `(`.
    OpenParen,
    /// Closing parenthesis `)`.
    CloseParen,
    /// Opening bracket `[`.
    OpenBracket,
    /// Closing bracket `]`.
    CloseBracket,
    /// Assignment `=`.
    Equals,
    /// Argument separator `,`.
    Comma,
}

/// A single token with its kind, lexeme text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}
