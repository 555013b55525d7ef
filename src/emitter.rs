//! Serializes a generated listing into NASM assembly text.
//!
//! One instruction per line, emission order preserved exactly; no
//! reordering, no deduplication.

use crate::codegen::{Instruction, Listing};

/// Serialize a `Listing` into NASM source text.
///
/// Deterministic: the same listing always produces byte-identical
/// output.
#[must_use]
pub fn emit(listing: &Listing) -> String {
    let mut out = String::new();
    for instruction in &listing.instructions {
        emit_instruction(&mut out, instruction);
        out.push('\n');
    }
    out
}

fn emit_instruction(out: &mut String, instruction: &Instruction) {
    match instruction {
        Instruction::Directive(text) => out.push_str(text),
        Instruction::Label(name) => {
            // NASM-local labels are indented with the routine body.
            if name.starts_with('.') {
                out.push_str("    ");
            }
            out.push_str(name);
            out.push(':');
        }
        Instruction::Op { mnemonic, operands } => {
            out.push_str("    ");
            out.push_str(mnemonic);
            if !operands.is_empty() {
                out.push(' ');
                out.push_str(operands);
            }
        }
        Instruction::Data { label, bytes } => {
            out.push_str(label);
            out.push_str(" db ");
            out.push_str(&db_operands(bytes));
        }
        Instruction::Blank => {}
    }
}

/// Render raw bytes as NASM `db` operands: printable runs quoted,
/// everything else (quotes, control bytes, the terminator) numeric.
fn db_operands(bytes: &[u8]) -> String {
    let mut parts = Vec::new();
    let mut run = String::new();

    for &b in bytes {
        if (0x20..0x7F).contains(&b) && b != b'"' {
            run.push(char::from(b));
        } else {
            if !run.is_empty() {
                parts.push(format!("\"{run}\""));
                run.clear();
            }
            parts.push(b.to_string());
        }
    }
    if !run.is_empty() {
        parts.push(format!("\"{run}\""));
    }

    parts.join(", ")
}
