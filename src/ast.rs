use std::fmt;

use crate::token::{Operator, Span};

/// A fully parsed Long program: ordered top-level statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Output channel of a `DisplayText` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Print the text directly on the boot console.
    Direct,
    /// Hand the text to the shell emission strategy.
    Shell,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("DIRECT"),
            Self::Shell => f.write_str("SHELL"),
        }
    }
}

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Top-level statement forms.
///
/// A block exclusively owns its child statements; the tree has no
/// sharing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    /// `DisplayText(DIRECT|SHELL)=<expr>`
    DisplayText { channel: Channel, value: Expr },
    /// `Set[<name>]=<expr>`
    Set { name: String, value: Expr },
    /// `If(<cond>) ... [Else ...] EndIf`
    If {
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Vec<Stmt>,
    },
}

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression forms. Trees, no cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// Base-10 integer literal.
    Int(i64),
    /// String literal (escapes already resolved by the lexer).
    Str(String),
    /// `True` or `False`.
    Bool(bool),
    /// Variable reference.
    Var(String),
    /// `Math(<op>, <lhs>, <rhs>)`
    Math {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `ReadFile[<path>]`
    ReadFile { path: Box<Expr> },
}
