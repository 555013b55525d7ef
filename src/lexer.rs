use std::fmt;

use crate::token::{Operator, Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Unterminated double-quoted string.
    UnterminatedString,
    /// Integer literal does not fit in `i64`.
    IntegerOverflow { literal: String },
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => {
                write!(f, "unterminated quoted string")
            }
            Self::IntegerOverflow { literal } => {
                write!(f, "integer literal out of range: {literal}")
            }
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize a Long source string into a sequence of tokens.
///
/// Whitespace, newlines, and `//` / `#` comments are discarded.
///
/// # Errors
///
/// Returns `LexError` on unterminated strings, out-of-range integer
/// literals, or characters that start no token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        let bytes = input.as_bytes();
        let start = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            3
        } else {
            0
        };
        Self {
            src: input,
            input: bytes,
            pos: start,
            line: 1,
            col: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.pos < self.input.len() {
            let ch = self.input[self.pos];

            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                b'#' => self.skip_comment(),
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_comment();
                }
                b'(' => tokens.push(self.punct(TokenKind::OpenParen, "(")),
                b')' => tokens.push(self.punct(TokenKind::CloseParen, ")")),
                b'[' => tokens.push(self.punct(TokenKind::OpenBracket, "[")),
                b']' => tokens.push(self.punct(TokenKind::CloseBracket, "]")),
                b',' => tokens.push(self.punct(TokenKind::Comma, ",")),
                b'=' => {
                    if self.peek_at(1) == Some(b'=') {
                        let tok = self.make_token(
                            TokenKind::Operator(Operator::EqEq),
                            "==".to_string(),
                        );
                        self.advance();
                        self.advance();
                        tokens.push(tok);
                    } else {
                        tokens.push(self.punct(TokenKind::Equals, "="));
                    }
                }
                b'+' => tokens.push(self.punct(TokenKind::Operator(Operator::Plus), "+")),
                b'-' => tokens.push(self.punct(TokenKind::Operator(Operator::Minus), "-")),
                b'*' => tokens.push(self.punct(TokenKind::Operator(Operator::Star), "*")),
                b'/' => tokens.push(self.punct(TokenKind::Operator(Operator::Slash), "/")),
                b'"' => tokens.push(self.read_quoted_string()?),
                b'0'..=b'9' => tokens.push(self.read_number()?),
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => tokens.push(self.read_word()),
                _ => {
                    return Err(LexError {
                        kind: LexErrorKind::UnexpectedCharacter(self.current_char()),
                        span: self.span(),
                    });
                }
            }
        }

        Ok(tokens)
    }

    const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.col,
        }
    }

    const fn make_token(&self, kind: TokenKind, text: String) -> Token {
        Token {
            kind,
            text,
            span: self.span(),
        }
    }

    /// Single-character token (the spelling is fixed).
    fn punct(&mut self, kind: TokenKind, text: &str) -> Token {
        let tok = self.make_token(kind, text.to_string());
        self.advance();
        tok
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            if self.input[self.pos] == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    /// The full character at the cursor. The cursor only ever stops on
    /// character boundaries, so the decode cannot fail.
    fn current_char(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\u{FFFD}')
    }

    /// Consume one full character and return it.
    fn advance_char(&mut self) -> char {
        let ch = self.current_char();
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn skip_comment(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos] != b'\n' {
            self.pos += 1;
            self.col += 1;
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token, LexError> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // skip opening quote

        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedString,
                        span: Span {
                            line: start_line,
                            column: start_col,
                        },
                    });
                }
                Some(b'\\') => {
                    self.advance();
                    match self.peek() {
                        Some(b'n') => {
                            value.push('\n');
                            self.advance();
                        }
                        Some(b't') => {
                            value.push('\t');
                            self.advance();
                        }
                        Some(b'r') => {
                            value.push('\r');
                            self.advance();
                        }
                        Some(b'"') => {
                            value.push('"');
                            self.advance();
                        }
                        Some(b'\\') => {
                            value.push('\\');
                            self.advance();
                        }
                        Some(_) => {
                            value.push('\\');
                            value.push(self.advance_char());
                        }
                        None => {
                            value.push('\\');
                        }
                    }
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    value.push(self.advance_char());
                }
            }
        }

        Ok(Token {
            kind: TokenKind::QuotedString,
            text: value,
            span: Span {
                line: start_line,
                column: start_col,
            },
        })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start_line = self.line;
        let start_col = self.col;
        let start = self.pos;

        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
            self.col += 1;
        }

        // A letter right after the digits makes the whole run a word,
        // so markers like `[16BIT]` lex as a single token.
        if matches!(self.peek(), Some(b'A'..=b'Z' | b'a'..=b'z' | b'_')) {
            while matches!(
                self.peek(),
                Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
            ) {
                self.pos += 1;
                self.col += 1;
            }
            let text = self.src[start..self.pos].to_string();
            return Ok(Token {
                kind: TokenKind::Word,
                text,
                span: Span {
                    line: start_line,
                    column: start_col,
                },
            });
        }

        let text = self.src[start..self.pos].to_string();
        let value = text.parse::<i64>().map_err(|_| LexError {
            kind: LexErrorKind::IntegerOverflow {
                literal: text.clone(),
            },
            span: Span {
                line: start_line,
                column: start_col,
            },
        })?;

        Ok(Token {
            kind: TokenKind::Integer(value),
            text,
            span: Span {
                line: start_line,
                column: start_col,
            },
        })
    }

    fn read_word(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let start = self.pos;

        while matches!(
            self.peek(),
            Some(b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
        ) {
            self.pos += 1;
            self.col += 1;
        }

        let text = self.src[start..self.pos].to_string();

        Token {
            kind: TokenKind::Word,
            text,
            span: Span {
                line: start_line,
                column: start_col,
            },
        }
    }
}
