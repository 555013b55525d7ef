//! End-to-end pipeline tests: Long source text in, NASM artifact
//! out, with every stage's failure mode exercised through the
//! public API.

use longc::{
    Error, EvalErrorKind, LexErrorKind, MemoryResolver, ParseErrorKind, ShellDialect,
    TargetConfig, compile_listing, compile_str,
};

mod common;
use common::{assert_prints, compile, compile_with};

// -----------------------------------------------------------
// Constant folding into the artifact.
// -----------------------------------------------------------

#[test]
fn set_literal_then_display() {
    let asm = compile("Set[X]=42\nDisplayText(DIRECT)=X").expect("compile failed");
    assert_prints(&asm, "42");
}

#[test]
fn folded_arithmetic() {
    let asm = compile("DisplayText(DIRECT)=Math(*, Math(+, 2, 3), 4)").expect("compile failed");
    assert_prints(&asm, "20");
}

#[test]
fn folded_concatenation_and_interpolation() {
    let asm = compile(
        "Set[WHO]=Math(+, \"wo\", \"rld\")\nDisplayText(DIRECT)=\"hello <`WHO`>\"",
    )
    .expect("compile failed");
    assert_prints(&asm, "hello world");
}

#[test]
fn read_file_content_is_embedded() {
    let mut resolver = MemoryResolver::new();
    resolver.insert("banner.txt", "LONG OS v1");
    let asm = compile_with(
        "Set[BANNER]=ReadFile[\"banner.txt\"]\nDisplayText(DIRECT)=BANNER",
        &resolver,
    )
    .expect("compile failed");
    assert_prints(&asm, "LONG OS v1");
}

#[test]
fn multibyte_text_is_embedded_verbatim() {
    let asm = compile("DisplayText(DIRECT)=\"café\"").expect("compile failed");
    // é is 0xC3 0xA9; exactly those two bytes, no re-encoding.
    assert!(asm.contains("msg_0 db \"caf\", 195, 169, 0"), "asm was: {asm}");
}

#[test]
fn boot_sector_frame_is_present() {
    let asm = compile("DisplayText(DIRECT)=\"hi\"").expect("compile failed");
    assert!(asm.starts_with("bits 16\norg 0x7C00\n"));
    assert!(asm.contains("int 0x10"));
    assert!(asm.contains("times 510 - ($ - $$) db 0\ndw 0xAA55\n"));
}

// -----------------------------------------------------------
// Branch resolution: the dead arm never reaches codegen.
// -----------------------------------------------------------

#[test]
fn if_true_keeps_then_branch_only() {
    let asm = compile(
        "If(True)\nDisplayText(DIRECT)=\"kept\"\nElse\nDisplayText(DIRECT)=\"dead\"\nEndIf",
    )
    .expect("compile failed");
    assert_prints(&asm, "kept");
    assert!(!asm.contains("dead"));
}

#[test]
fn if_false_keeps_else_branch_only() {
    let asm = compile(
        "If(False)\nDisplayText(DIRECT)=\"dead\"\nElse\nDisplayText(DIRECT)=\"kept\"\nEndIf",
    )
    .expect("compile failed");
    assert_prints(&asm, "kept");
    assert!(!asm.contains("dead"));
}

#[test]
fn computed_condition() {
    let asm = compile(
        "Set[N]=Math(+, 1, 1)\nIf(Math(==, N, 2))\nDisplayText(DIRECT)=\"two\"\nEndIf",
    )
    .expect("compile failed");
    assert_prints(&asm, "two");
}

// -----------------------------------------------------------
// Error taxonomy: first error halts, nothing is emitted.
// -----------------------------------------------------------

#[test]
fn lex_error() {
    let Err(Error::Lex(e)) = compile("Set[X]=€") else {
        panic!("expected lex error");
    };
    assert!(matches!(e.kind, LexErrorKind::UnexpectedCharacter(_)));
}

#[test]
fn unmatched_if_is_a_parse_error() {
    let Err(Error::Parse(e)) = compile("If(True)\nDisplayText(DIRECT)=\"x\"") else {
        panic!("expected parse error");
    };
    assert_eq!(e.kind, ParseErrorKind::UnmatchedIf);
}

#[test]
fn unknown_statement_is_a_parse_error() {
    let Err(Error::Parse(e)) = compile("TrackInput[KEYBOARD]") else {
        panic!("expected parse error");
    };
    assert!(matches!(e.kind, ParseErrorKind::UnknownStatement { .. }));
}

#[test]
fn division_by_zero() {
    let Err(Error::Eval(e)) = compile("DisplayText(DIRECT)=Math(/, 4, 0)") else {
        panic!("expected eval error");
    };
    assert_eq!(e.kind, EvalErrorKind::DivisionByZero);
}

#[test]
fn mixed_operands() {
    let Err(Error::Eval(e)) = compile("DisplayText(DIRECT)=Math(+, 1, \"a\")") else {
        panic!("expected eval error");
    };
    assert!(matches!(e.kind, EvalErrorKind::OperandMismatch { .. }));
}

#[test]
fn unbound_identifier_names_it() {
    let Err(Error::Eval(e)) = compile("DisplayText(DIRECT)=GHOST") else {
        panic!("expected eval error");
    };
    assert_eq!(
        e.kind,
        EvalErrorKind::UndefinedVariable {
            name: "GHOST".to_string()
        }
    );
}

#[test]
fn missing_read_file_halts_before_emission() {
    let result = compile(
        "DisplayText(DIRECT)=\"early\"\nSet[X]=ReadFile[\"missing.txt\"]",
    );
    let Err(Error::Eval(e)) = result else {
        panic!("expected eval error, got {result:?}");
    };
    assert_eq!(
        e.kind,
        EvalErrorKind::FileNotFound {
            path: "missing.txt".to_string()
        }
    );
}

#[test]
fn errors_render_with_position() {
    let err = compile("If(1)\nEndIf").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("line 1"), "message was: {message}");
}

// -----------------------------------------------------------
// Determinism and channel handling.
// -----------------------------------------------------------

#[test]
fn recompilation_is_byte_identical() {
    let source = "[16BIT]\nstartprogram\nSet[A]=Math(+, 20, 22)\n\
                  If(Math(==, A, 42))\nDisplayText(DIRECT)=\"answer: <`A`>\"\n\
                  Else\nDisplayText(SHELL)=\"no answer\"\nEndIf\nendprogram";
    let first = compile(source).expect("compile failed");
    let second = compile(source).expect("compile failed");
    assert_eq!(first, second);
}

#[test]
fn shell_dialect_is_pluggable() {
    let source = "DisplayText(SHELL)=\"reboot\"";
    let teletype = compile(source).expect("compile failed");
    assert!(teletype.contains("call shell_print"));

    let target = TargetConfig {
        shell: ShellDialect::Invoke {
            routine: "shell_exec".to_string(),
        },
        ..TargetConfig::default()
    };
    let invoked = compile_str(source, &MemoryResolver::new(), &target)
        .expect("compile failed");
    assert!(invoked.contains("call shell_exec"));
    assert!(!invoked.contains("shell_print"));
}

#[test]
fn listing_reports_budget_overflow() {
    let target = TargetConfig {
        byte_budget: Some(32),
        ..TargetConfig::default()
    };
    let listing = compile_listing(
        "DisplayText(DIRECT)=\"a fairly long message for a tiny budget\"",
        &MemoryResolver::new(),
        &target,
    )
    .expect("compile failed");
    assert!(listing.over_budget(&target).is_some());
    // Soft condition: the listing is still complete.
    assert!(!listing.instructions.is_empty());
}

#[test]
fn requests_keep_source_order() {
    let asm = compile(
        "DisplayText(DIRECT)=\"first\"\nDisplayText(DIRECT)=\"second\"",
    )
    .expect("compile failed");
    let first = asm.find("msg_0 db \"first\"").expect("msg_0 missing");
    let second = asm.find("msg_1 db \"second\"").expect("msg_1 missing");
    assert!(first < second);
}
