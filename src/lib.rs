//! Compiler for the Long statement language, targeting raw x86
//! boot-sector assembly.
//!
//! The pipeline runs strictly downward: lexer, parser, constant
//! evaluator, code generator, emitter. The target executes with no
//! operating system, file system, or runtime library, so every
//! dynamic construct — variables, `Math` arithmetic, `ReadFile`
//! content, `If/Else` branches — is resolved at compile time; only
//! literal `DisplayText` output reaches code generation.
//!
//! # Quick start
//!
//! ```
//! use longc::{MemoryResolver, TargetConfig, compile_str};
//!
//! let source = "Set[X]=Math(+, 2, 3)\nDisplayText(DIRECT)=X";
//! let asm = compile_str(source, &MemoryResolver::new(), &TargetConfig::default()).unwrap();
//! assert!(asm.contains("msg_0 db \"5\", 0"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod codegen;
pub mod emitter;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Channel, Expr, ExprKind, Program, Stmt, StmtKind};
pub use codegen::{Instruction, Listing, ShellDialect, TargetConfig, generate};
pub use emitter::emit;
pub use eval::{
    DisplayRequest, EvalError, EvalErrorKind, FileResolver, FsResolver, MemoryResolver, Value,
    evaluate,
};
pub use lexer::{LexError, LexErrorKind, tokenize};
pub use parser::{ParseError, ParseErrorKind, parse};
pub use token::{Operator, Span, Token, TokenKind};

/// Unified error type covering every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// A constant-evaluation error.
    #[error("{0}")]
    Eval(#[from] EvalError),
}

/// Run the pipeline up to code generation, keeping the listing so
/// callers can inspect the byte-size estimate.
pub fn compile_listing<R: FileResolver + ?Sized>(
    input: &str,
    resolver: &R,
    target: &TargetConfig,
) -> Result<Listing, Error> {
    let tokens = tokenize(input)?;
    let program = parse(&tokens)?;
    let requests = evaluate(&program, resolver)?;
    Ok(generate(&requests, target))
}

/// Compile Long source text to NASM assembly in one step.
pub fn compile_str<R: FileResolver + ?Sized>(
    input: &str,
    resolver: &R,
    target: &TargetConfig,
) -> Result<String, Error> {
    Ok(emit(&compile_listing(input, resolver, target)?))
}
