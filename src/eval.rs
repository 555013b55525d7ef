//! Compile-time constant evaluation.
//!
//! Walks the statement tree in source order with a symbol table,
//! folding every `Set`, `Math`, `ReadFile`, and `If` away. What
//! survives is a linear sequence of resolved display requests, the
//! complete interface to the code generator. The boot-sector target
//! has no interpreter, so nothing dynamic may leak past this stage.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::ast::{Channel, Expr, ExprKind, Program, Stmt, StmtKind};
use crate::token::{Operator, Span};

/// A value produced by constant evaluation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// Kind name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
        }
    }
}

impl fmt::Display for Value {
    /// Render for `DisplayText`: integers base-10, strings verbatim,
    /// booleans as the fixed `True`/`False` pair.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
        }
    }
}

/// A fully resolved `DisplayText` statement: the only statement kind
/// that survives into code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRequest {
    pub channel: Channel,
    pub text: String,
}

/// Compile-time file-reading collaborator for `ReadFile[...]`.
pub trait FileResolver {
    /// Return the contents of `path`, or an error if it cannot be
    /// read.
    ///
    /// # Errors
    ///
    /// Implementations return `io::Error` for missing or unreadable
    /// paths; the evaluator reports it as a resolution error.
    fn read(&self, path: &str) -> io::Result<String>;
}

/// Resolver backed by the file system, relative to a base directory.
#[derive(Debug, Clone)]
pub struct FsResolver {
    base: PathBuf,
}

impl FsResolver {
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl FileResolver for FsResolver {
    fn read(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.base.join(path))
    }
}

/// In-memory resolver for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: HashMap<String, String>,
}

impl MemoryResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl FileResolver for MemoryResolver {
    fn read(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// Classifies an evaluation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// Variable referenced before any `Set` bound it.
    UndefinedVariable { name: String },
    /// `ReadFile` target the resolver could not produce.
    FileNotFound { path: String },
    /// `Math` operands of incompatible kinds for the operator.
    OperandMismatch {
        op: Operator,
        lhs: &'static str,
        rhs: &'static str,
    },
    /// `ReadFile` path expression that is not a string.
    PathNotString { found: &'static str },
    /// `If` condition that is not a boolean.
    ConditionNotBoolean { found: &'static str },
    /// Division by zero in `Math(/, ...)`.
    DivisionByZero,
    /// Integer arithmetic out of `i64` range.
    Overflow { op: Operator },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable { name } => {
                write!(f, "undefined variable: '{name}'")
            }
            Self::FileNotFound { path } => {
                write!(f, "ReadFile target not found: '{path}'")
            }
            Self::OperandMismatch { op, lhs, rhs } => {
                write!(f, "operator '{op}' cannot combine {lhs} and {rhs}")
            }
            Self::PathNotString { found } => {
                write!(f, "ReadFile path must be a string, got {found}")
            }
            Self::ConditionNotBoolean { found } => {
                write!(f, "If condition must be a boolean, got {found}")
            }
            Self::DivisionByZero => {
                write!(f, "division by zero")
            }
            Self::Overflow { op } => {
                write!(f, "integer overflow in '{op}'")
            }
        }
    }
}

/// Error produced during constant evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Span,
}

/// Evaluate a program down to its resolved display requests.
///
/// Statements run in source order against an initially empty symbol
/// table. `Set` binds (last write wins), `If` keeps exactly one
/// branch, `ReadFile` embeds file content through `resolver`, and
/// `DisplayText` contributes one request. Halts at the first error.
///
/// # Errors
///
/// Returns `EvalError` for unbound variables, kind mismatches,
/// division by zero, overflow, or unresolvable `ReadFile` targets.
pub fn evaluate<R: FileResolver + ?Sized>(
    program: &Program,
    resolver: &R,
) -> Result<Vec<DisplayRequest>, EvalError> {
    let mut evaluator = Evaluator {
        symbols: HashMap::new(),
        resolver,
        requests: Vec::new(),
    };
    evaluator.eval_block(&program.statements)?;
    Ok(evaluator.requests)
}

struct Evaluator<'a, R: FileResolver + ?Sized> {
    symbols: HashMap<String, Value>,
    resolver: &'a R,
    requests: Vec<DisplayRequest>,
}

impl<R: FileResolver + ?Sized> Evaluator<'_, R> {
    fn eval_block(&mut self, statements: &[Stmt]) -> Result<(), EvalError> {
        for stmt in statements {
            match &stmt.kind {
                StmtKind::Set { name, value } => {
                    let value = self.eval_expr(value)?;
                    self.symbols.insert(name.clone(), value);
                }
                StmtKind::DisplayText { channel, value } => {
                    let value = self.eval_expr(value)?;
                    self.requests.push(DisplayRequest {
                        channel: *channel,
                        text: value.to_string(),
                    });
                }
                StmtKind::If {
                    cond,
                    then_block,
                    else_block,
                } => {
                    let branch = match self.eval_expr(cond)? {
                        Value::Bool(true) => then_block,
                        Value::Bool(false) => else_block,
                        other => {
                            return Err(EvalError {
                                kind: EvalErrorKind::ConditionNotBoolean {
                                    found: other.kind_name(),
                                },
                                span: cond.span,
                            });
                        }
                    };
                    self.eval_block(branch)?;
                }
            }
        }
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Int(v) => Ok(Value::Int(*v)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Str(s) => self.interpolate(s, expr.span),
            ExprKind::Var(name) => {
                self.symbols
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError {
                        kind: EvalErrorKind::UndefinedVariable { name: name.clone() },
                        span: expr.span,
                    })
            }
            ExprKind::Math { op, lhs, rhs } => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                apply_math(*op, lhs, rhs, expr.span)
            }
            ExprKind::ReadFile { path } => {
                let path = match self.eval_expr(path)? {
                    Value::Str(p) => p,
                    other => {
                        return Err(EvalError {
                            kind: EvalErrorKind::PathNotString {
                                found: other.kind_name(),
                            },
                            span: expr.span,
                        });
                    }
                };
                match self.resolver.read(&path) {
                    Ok(content) => Ok(Value::Str(content)),
                    Err(_) => Err(EvalError {
                        kind: EvalErrorKind::FileNotFound { path },
                        span: expr.span,
                    }),
                }
            }
        }
    }

    /// Substitute `` <`NAME`> `` references inside a string literal
    /// with the rendered value of the named variable.
    fn interpolate(&self, text: &str, span: Span) -> Result<Value, EvalError> {
        if !text.contains("<`") {
            return Ok(Value::Str(text.to_string()));
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("<`") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("`>") else {
                // No closing marker: the rest is literal text.
                out.push_str("<`");
                rest = after;
                continue;
            };
            let name = &after[..end];
            let value = self.symbols.get(name).ok_or_else(|| EvalError {
                kind: EvalErrorKind::UndefinedVariable {
                    name: name.to_string(),
                },
                span,
            })?;
            out.push_str(&value.to_string());
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(Value::Str(out))
    }
}

fn apply_math(op: Operator, lhs: Value, rhs: Value, span: Span) -> Result<Value, EvalError> {
    let mismatch = |lhs: &Value, rhs: &Value| EvalError {
        kind: EvalErrorKind::OperandMismatch {
            op,
            lhs: lhs.kind_name(),
            rhs: rhs.kind_name(),
        },
        span,
    };
    let overflow = EvalError {
        kind: EvalErrorKind::Overflow { op },
        span,
    };

    match op {
        Operator::Plus => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_add(b).map(Value::Int).ok_or(overflow)
            }
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (lhs, rhs) => Err(mismatch(&lhs, &rhs)),
        },
        Operator::Minus => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_sub(b).map(Value::Int).ok_or(overflow)
            }
            (lhs, rhs) => Err(mismatch(&lhs, &rhs)),
        },
        Operator::Star => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_mul(b).map(Value::Int).ok_or(overflow)
            }
            (lhs, rhs) => Err(mismatch(&lhs, &rhs)),
        },
        Operator::Slash => match (lhs, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(EvalError {
                kind: EvalErrorKind::DivisionByZero,
                span,
            }),
            (Value::Int(a), Value::Int(b)) => {
                a.checked_div(b).map(Value::Int).ok_or(overflow)
            }
            (lhs, rhs) => Err(mismatch(&lhs, &rhs)),
        },
        Operator::EqEq => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a == b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a == b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a == b)),
            (lhs, rhs) => Err(mismatch(&lhs, &rhs)),
        },
    }
}
