use std::fmt;

use crate::ast::{Channel, Expr, ExprKind, Program, Stmt, StmtKind};
use crate::token::{Span, Token, TokenKind};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input ended where a token was required.
    UnexpectedEof { expected: &'static str },
    /// Found a token that does not fit the grammar here.
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    /// Top-level word that starts no known statement form.
    UnknownStatement { found: String },
    /// `DisplayText` channel other than DIRECT or SHELL.
    UnknownChannel { found: String },
    /// `If` block still open when input ended.
    UnmatchedIf,
    /// `Else` or `EndIf` outside any `If` block.
    StrayBlockTerminator { found: String },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { expected } => {
                write!(f, "expected {expected}, found end of input")
            }
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, got '{found}'")
            }
            Self::UnknownStatement { found } => {
                write!(f, "unknown statement: '{found}'")
            }
            Self::UnknownChannel { found } => {
                write!(f, "unknown DisplayText channel: '{found}'")
            }
            Self::UnmatchedIf => {
                write!(f, "unmatched If, expected EndIf")
            }
            Self::StrayBlockTerminator { found } => {
                write!(f, "'{found}' without matching If")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Statement keywords that can never be variable references.
const RESERVED: &[&str] = &["Set", "DisplayText", "If", "Else", "EndIf", "Math", "ReadFile"];

/// Structural marker words the parser accepts and discards.
const MARKERS: &[&str] = &["startprogram", "endprogram", "startsection", "endsection"];

/// Parse a token stream into a `Program`.
///
/// Recursive descent over the self-delimiting statement grammar;
/// halts at the first error, no recovery.
///
/// # Errors
///
/// Returns `ParseError` on unknown statement forms, unmatched
/// `If`/`EndIf` nesting, or any token out of place.
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    Parser::new(tokens).parse()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        while self.pos < self.tokens.len() {
            if self.skip_marker()? {
                continue;
            }
            if let TokenKind::Word = self.tokens[self.pos].kind {
                let text = self.tokens[self.pos].text.as_str();
                if text == "Else" || text == "EndIf" {
                    return Err(ParseError {
                        kind: ParseErrorKind::StrayBlockTerminator {
                            found: text.to_string(),
                        },
                        span: self.tokens[self.pos].span,
                    });
                }
            }
            statements.push(self.parse_statement()?);
        }

        Ok(Program { statements })
    }

    /// Consume a structural marker (`startprogram`, `[16BIT]`, ...) if
    /// one starts here. Returns whether anything was consumed.
    fn skip_marker(&mut self) -> Result<bool, ParseError> {
        let token = &self.tokens[self.pos];
        match &token.kind {
            TokenKind::Word if MARKERS.contains(&token.text.as_str()) => {
                self.pos += 1;
                Ok(true)
            }
            TokenKind::OpenBracket
                if matches!(
                    self.tokens.get(self.pos + 1),
                    Some(t) if t.kind == TokenKind::Word && t.text == "16BIT"
                ) =>
            {
                self.pos += 1; // [
                self.pos += 1; // 16BIT
                self.expect(&TokenKind::CloseBracket, "']'")?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let token = self.next("statement")?.clone();
        let span = token.span;

        let TokenKind::Word = token.kind else {
            return Err(ParseError {
                kind: ParseErrorKind::UnknownStatement {
                    found: token.text.clone(),
                },
                span,
            });
        };

        let kind = match token.text.as_str() {
            "DisplayText" => self.parse_display_text()?,
            "Set" => self.parse_set()?,
            "If" => self.parse_if()?,
            other => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnknownStatement {
                        found: other.to_string(),
                    },
                    span,
                });
            }
        };

        Ok(Stmt { kind, span })
    }

    fn parse_display_text(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(&TokenKind::OpenParen, "'('")?;
        let channel_tok = self.next("channel name")?.clone();
        let channel = match &channel_tok.kind {
            TokenKind::Word if channel_tok.text.eq_ignore_ascii_case("DIRECT") => Channel::Direct,
            TokenKind::Word if channel_tok.text.eq_ignore_ascii_case("SHELL") => Channel::Shell,
            _ => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnknownChannel {
                        found: channel_tok.text.clone(),
                    },
                    span: channel_tok.span,
                });
            }
        };
        self.expect(&TokenKind::CloseParen, "')'")?;
        self.expect(&TokenKind::Equals, "'='")?;
        let value = self.parse_expr()?;
        Ok(StmtKind::DisplayText { channel, value })
    }

    fn parse_set(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(&TokenKind::OpenBracket, "'['")?;
        let name_tok = self.next("variable name")?.clone();
        let TokenKind::Word = name_tok.kind else {
            return Err(ParseError {
                kind: ParseErrorKind::UnexpectedToken {
                    expected: "variable name",
                    found: name_tok.text.clone(),
                },
                span: name_tok.span,
            });
        };
        self.expect(&TokenKind::CloseBracket, "']'")?;
        self.expect(&TokenKind::Equals, "'='")?;
        let value = self.parse_expr()?;
        Ok(StmtKind::Set {
            name: name_tok.text,
            value,
        })
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(&TokenKind::OpenParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::CloseParen, "')'")?;

        let mut then_block = Vec::new();
        let mut else_block = Vec::new();
        let mut in_else = false;

        loop {
            if self.pos >= self.tokens.len() {
                return Err(ParseError {
                    kind: ParseErrorKind::UnmatchedIf,
                    span: self.eof_span(),
                });
            }
            if self.skip_marker()? {
                continue;
            }

            let token = &self.tokens[self.pos];
            if token.kind == TokenKind::Word {
                match token.text.as_str() {
                    "EndIf" => {
                        self.pos += 1;
                        break;
                    }
                    "Else" if !in_else => {
                        self.pos += 1;
                        in_else = true;
                        continue;
                    }
                    "Else" => {
                        return Err(ParseError {
                            kind: ParseErrorKind::StrayBlockTerminator {
                                found: "Else".to_string(),
                            },
                            span: token.span,
                        });
                    }
                    _ => {}
                }
            }

            let stmt = self.parse_statement()?;
            if in_else {
                else_block.push(stmt);
            } else {
                then_block.push(stmt);
            }
        }

        Ok(StmtKind::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let token = self.next("expression")?.clone();
        let span = token.span;

        let kind = match &token.kind {
            TokenKind::Integer(value) => ExprKind::Int(*value),
            TokenKind::QuotedString => ExprKind::Str(token.text.clone()),
            TokenKind::Operator(crate::token::Operator::Minus) => {
                let lit = self.next("integer literal")?.clone();
                let TokenKind::Integer(value) = lit.kind else {
                    return Err(ParseError {
                        kind: ParseErrorKind::UnexpectedToken {
                            expected: "integer literal",
                            found: lit.text.clone(),
                        },
                        span: lit.span,
                    });
                };
                ExprKind::Int(-value)
            }
            TokenKind::Word => match token.text.as_str() {
                "True" => ExprKind::Bool(true),
                "False" => ExprKind::Bool(false),
                "Math" => self.parse_math()?,
                "ReadFile" => self.parse_read_file()?,
                name if RESERVED.contains(&name) => {
                    return Err(ParseError {
                        kind: ParseErrorKind::UnexpectedToken {
                            expected: "expression",
                            found: name.to_string(),
                        },
                        span,
                    });
                }
                name => ExprKind::Var(name.to_string()),
            },
            _ => {
                return Err(ParseError {
                    kind: ParseErrorKind::UnexpectedToken {
                        expected: "expression",
                        found: token.text.clone(),
                    },
                    span,
                });
            }
        };

        Ok(Expr { kind, span })
    }

    fn parse_math(&mut self) -> Result<ExprKind, ParseError> {
        self.expect(&TokenKind::OpenParen, "'('")?;
        let op_tok = self.next("operator")?.clone();
        let TokenKind::Operator(op) = op_tok.kind else {
            return Err(ParseError {
                kind: ParseErrorKind::UnexpectedToken {
                    expected: "operator",
                    found: op_tok.text.clone(),
                },
                span: op_tok.span,
            });
        };
        self.expect(&TokenKind::Comma, "','")?;
        let lhs = self.parse_expr()?;
        self.expect(&TokenKind::Comma, "','")?;
        let rhs = self.parse_expr()?;
        self.expect(&TokenKind::CloseParen, "')'")?;
        Ok(ExprKind::Math {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_read_file(&mut self) -> Result<ExprKind, ParseError> {
        self.expect(&TokenKind::OpenBracket, "'['")?;
        let path = self.parse_expr()?;
        self.expect(&TokenKind::CloseBracket, "']'")?;
        Ok(ExprKind::ReadFile {
            path: Box::new(path),
        })
    }

    fn next(&mut self, expected: &'static str) -> Result<&Token, ParseError> {
        if self.pos >= self.tokens.len() {
            return Err(ParseError {
                kind: ParseErrorKind::UnexpectedEof { expected },
                span: self.eof_span(),
            });
        }
        let token = &self.tokens[self.pos];
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.pos >= self.tokens.len() {
            return Err(ParseError {
                kind: ParseErrorKind::UnexpectedEof { expected },
                span: self.eof_span(),
            });
        }
        if &self.tokens[self.pos].kind != kind {
            return Err(ParseError {
                kind: ParseErrorKind::UnexpectedToken {
                    expected,
                    found: self.tokens[self.pos].text.clone(),
                },
                span: self.tokens[self.pos].span,
            });
        }
        self.pos += 1;
        Ok(())
    }

    fn eof_span(&self) -> Span {
        self.tokens
            .last()
            .map_or(Span { line: 1, column: 1 }, |last| last.span)
    }
}
