//! Code generation: lower resolved display requests into real-mode
//! x86 instructions for a raw boot sector.
//!
//! The evaluator has already collapsed every variable, conditional,
//! and file read, so the generator only sees literal text. Each
//! request becomes a `mov si, msg_N` plus a routine call; the text
//! itself lands in zero-terminated `db` data. Printing goes through
//! BIOS teletype (`int 0x10`, `AH=0x0E`); there is no OS to call.

use crate::ast::Channel;
use crate::eval::DisplayRequest;

/// Emission strategy for the SHELL display channel.
///
/// The boot environment defines no single shell convention, so the
/// instruction sequence is configuration rather than a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellDialect {
    /// Self-contained: route SHELL text through a dedicated teletype
    /// routine, distinct from DIRECT's `print_string`.
    Teletype,
    /// Call an externally supplied routine with `SI` pointing at the
    /// zero-terminated text. The surrounding toolchain links the
    /// routine in.
    Invoke { routine: String },
}

/// Target-environment configuration handed to the code generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Load address of the boot sector.
    pub origin: u16,
    /// Pad the image to 510 bytes and append the `0xAA55` signature.
    pub pad_to_sector: bool,
    /// Soft payload limit in bytes; exceeding it is a warning for
    /// the surrounding tool, never an error here. The exact limit
    /// depends on the boot-sector variant targeted.
    pub byte_budget: Option<usize>,
    /// SHELL channel emission strategy.
    pub shell: ShellDialect,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            origin: 0x7C00,
            pad_to_sector: true,
            byte_budget: Some(510),
            shell: ShellDialect::Teletype,
        }
    }
}

/// One assembly line. Append-only once generated; the emitter never
/// reorders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Assembler directive (`bits 16`, `org 0x7C00`, `times ...`).
    Directive(String),
    /// Label. Names starting with `.` are NASM-local.
    Label(String),
    /// Opcode with its operand text.
    Op {
        mnemonic: &'static str,
        operands: String,
    },
    /// Zero-terminated string data (`label db ..., 0`), terminator
    /// included in `bytes`.
    Data { label: String, bytes: Vec<u8> },
    /// Blank separator line.
    Blank,
}

/// Generated instruction sequence with its estimated payload size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub instructions: Vec<Instruction>,
    /// Estimated encoded size of code and data, excluding sector
    /// padding.
    pub code_bytes: usize,
}

impl Listing {
    /// Bytes over the target's soft budget, if any.
    #[must_use]
    pub fn over_budget(&self, target: &TargetConfig) -> Option<usize> {
        target
            .byte_budget
            .and_then(|budget| self.code_bytes.checked_sub(budget))
            .filter(|&excess| excess > 0)
    }
}

/// Generate boot-sector assembly for a resolved request sequence.
///
/// Deterministic: identical input always yields an identical
/// listing. Data labels are `msg_0, msg_1, ...` in request order.
#[must_use]
pub fn generate(requests: &[DisplayRequest], target: &TargetConfig) -> Listing {
    Generator::new(target).generate(requests)
}

struct Generator<'a> {
    target: &'a TargetConfig,
    out: Vec<Instruction>,
    bytes: usize,
}

impl<'a> Generator<'a> {
    const fn new(target: &'a TargetConfig) -> Self {
        Self {
            target,
            out: Vec::new(),
            bytes: 0,
        }
    }

    fn generate(mut self, requests: &[DisplayRequest]) -> Listing {
        let any_direct = requests.iter().any(|r| r.channel == Channel::Direct);
        let any_shell = requests.iter().any(|r| r.channel == Channel::Shell);
        let teletype_shell = any_shell && self.target.shell == ShellDialect::Teletype;

        self.directive("bits 16");
        self.directive(&format!("org 0x{:04X}", self.target.origin));
        self.blank();

        self.label("start");
        self.op("xor", "ax, ax");
        self.op("mov", "ds, ax");
        self.op("mov", "es, ax");
        self.op("mov", "ss, ax");
        self.op("mov", &format!("sp, 0x{:04X}", self.target.origin));
        self.blank();

        for (idx, request) in requests.iter().enumerate() {
            self.op("mov", &format!("si, msg_{idx}"));
            match (request.channel, &self.target.shell) {
                (Channel::Direct, _) => {
                    self.op("call", "print_string");
                    self.op("call", "print_crlf");
                }
                (Channel::Shell, ShellDialect::Teletype) => {
                    self.op("call", "shell_print");
                }
                (Channel::Shell, ShellDialect::Invoke { routine }) => {
                    let routine = routine.clone();
                    self.op("call", &routine);
                }
            }
        }
        if !requests.is_empty() {
            self.blank();
        }

        self.op("cli", "");
        self.op("hlt", "");

        if any_direct {
            self.emit_print_string();
        }
        if teletype_shell {
            self.emit_shell_print();
        }
        if any_direct || teletype_shell {
            self.emit_print_crlf();
        }

        if !requests.is_empty() {
            self.blank();
        }
        for (idx, request) in requests.iter().enumerate() {
            let mut bytes = request.text.clone().into_bytes();
            bytes.push(0);
            self.bytes += bytes.len();
            self.out.push(Instruction::Data {
                label: format!("msg_{idx}"),
                bytes,
            });
        }

        if self.target.pad_to_sector {
            self.blank();
            self.directive("times 510 - ($ - $$) db 0");
            self.directive("dw 0xAA55");
        }

        Listing {
            instructions: self.out,
            code_bytes: self.bytes,
        }
    }

    /// BIOS teletype print of the zero-terminated string at `SI`.
    fn emit_print_string(&mut self) {
        self.blank();
        self.label("print_string");
        self.label(".loop");
        self.op("lodsb", "");
        self.op("cmp", "al, 0");
        self.op("je", ".done");
        self.op("mov", "ah, 0x0E");
        self.op("int", "0x10");
        self.op("jmp", ".loop");
        self.label(".done");
        self.op("ret", "");
    }

    /// SHELL variant of the teletype print; terminates its own line.
    fn emit_shell_print(&mut self) {
        self.blank();
        self.label("shell_print");
        self.label(".loop");
        self.op("lodsb", "");
        self.op("cmp", "al, 0");
        self.op("je", ".done");
        self.op("mov", "ah, 0x0E");
        self.op("int", "0x10");
        self.op("jmp", ".loop");
        self.label(".done");
        self.op("call", "print_crlf");
        self.op("ret", "");
    }

    fn emit_print_crlf(&mut self) {
        self.blank();
        self.label("print_crlf");
        self.op("mov", "ah, 0x0E");
        self.op("mov", "al, 0x0D");
        self.op("int", "0x10");
        self.op("mov", "al, 0x0A");
        self.op("int", "0x10");
        self.op("ret", "");
    }

    fn directive(&mut self, text: &str) {
        self.out.push(Instruction::Directive(text.to_string()));
    }

    fn label(&mut self, name: &str) {
        self.out.push(Instruction::Label(name.to_string()));
    }

    fn blank(&mut self) {
        self.out.push(Instruction::Blank);
    }

    fn op(&mut self, mnemonic: &'static str, operands: &str) {
        self.bytes += encoded_size(mnemonic, operands);
        self.out.push(Instruction::Op {
            mnemonic,
            operands: operands.to_string(),
        });
    }
}

/// Estimated encoded size of one real-mode instruction.
///
/// Covers exactly the 8086 subset this generator emits; the budget
/// check is a soft warning, so an estimate is sufficient.
fn encoded_size(mnemonic: &str, operands: &str) -> usize {
    match mnemonic {
        "lodsb" | "ret" | "cli" | "hlt" => 1,
        // int imm8, short jumps, cmp al/imm8, reg-reg xor,
        // seg/8-bit moves
        "int" | "jmp" | "je" | "cmp" | "xor" => 2,
        // call rel16
        "call" => 3,
        "mov" => {
            let dest = operands.split(',').next().unwrap_or("").trim();
            match dest {
                // 16-bit register <- imm16/label
                "ax" | "bx" | "cx" | "dx" | "si" | "di" | "sp" | "bp" => 3,
                // segment <- reg, 8-bit reg <- imm8
                _ => 2,
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(text: &str) -> DisplayRequest {
        DisplayRequest {
            channel: Channel::Direct,
            text: text.to_string(),
        }
    }

    fn shell(text: &str) -> DisplayRequest {
        DisplayRequest {
            channel: Channel::Shell,
            text: text.to_string(),
        }
    }

    fn has_op(listing: &Listing, mnemonic: &str, operands: &str) -> bool {
        listing.instructions.iter().any(|ins| {
            matches!(
                ins,
                Instruction::Op { mnemonic: m, operands: o }
                if *m == mnemonic && o == operands
            )
        })
    }

    fn has_label(listing: &Listing, name: &str) -> bool {
        listing
            .instructions
            .iter()
            .any(|ins| matches!(ins, Instruction::Label(l) if l == name))
    }

    #[test]
    fn direct_request_uses_print_string() {
        let listing = generate(&[direct("hi")], &TargetConfig::default());
        assert!(has_op(&listing, "mov", "si, msg_0"));
        assert!(has_op(&listing, "call", "print_string"));
        assert!(has_op(&listing, "call", "print_crlf"));
        assert!(has_label(&listing, "print_string"));
    }

    #[test]
    fn shell_teletype_uses_own_routine() {
        let listing = generate(&[shell("status")], &TargetConfig::default());
        assert!(has_op(&listing, "call", "shell_print"));
        assert!(has_label(&listing, "shell_print"));
        // DIRECT's routine is not emitted when nothing needs it.
        assert!(!has_label(&listing, "print_string"));
    }

    #[test]
    fn shell_invoke_calls_configured_routine() {
        let target = TargetConfig {
            shell: ShellDialect::Invoke {
                routine: "shell_exec".to_string(),
            },
            ..TargetConfig::default()
        };
        let listing = generate(&[shell("run")], &target);
        assert!(has_op(&listing, "call", "shell_exec"));
        assert!(!has_label(&listing, "shell_print"));
    }

    #[test]
    fn data_is_zero_terminated_in_order() {
        let listing = generate(&[direct("a"), direct("b")], &TargetConfig::default());
        let data: Vec<_> = listing
            .instructions
            .iter()
            .filter_map(|ins| match ins {
                Instruction::Data { label, bytes } => Some((label.clone(), bytes.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0], ("msg_0".to_string(), vec![b'a', 0]));
        assert_eq!(data[1], ("msg_1".to_string(), vec![b'b', 0]));
    }

    #[test]
    fn padding_follows_configuration() {
        let padded = generate(&[], &TargetConfig::default());
        assert!(
            padded
                .instructions
                .iter()
                .any(|ins| matches!(ins, Instruction::Directive(d) if d == "dw 0xAA55"))
        );

        let bare = generate(
            &[],
            &TargetConfig {
                pad_to_sector: false,
                ..TargetConfig::default()
            },
        );
        assert!(
            !bare
                .instructions
                .iter()
                .any(|ins| matches!(ins, Instruction::Directive(d) if d == "dw 0xAA55"))
        );
    }

    #[test]
    fn empty_program_size() {
        // Header (2+2+2+2+3) plus cli/hlt (1+1).
        let listing = generate(&[], &TargetConfig::default());
        assert_eq!(listing.code_bytes, 13);
    }

    #[test]
    fn byte_count_includes_data() {
        let base = generate(&[], &TargetConfig::default()).code_bytes;
        let listing = generate(&[direct("abc")], &TargetConfig::default());
        // mov si (3) + two calls (6) + print_string (12) +
        // print_crlf (11) + data (4).
        assert_eq!(listing.code_bytes, base + 3 + 6 + 12 + 11 + 4);
    }

    #[test]
    fn over_budget_is_soft_and_reported() {
        let target = TargetConfig {
            byte_budget: Some(16),
            ..TargetConfig::default()
        };
        let listing = generate(&[direct("0123456789")], &target);
        let excess = listing.over_budget(&target).expect("should exceed");
        assert_eq!(excess, listing.code_bytes - 16);

        let unlimited = TargetConfig {
            byte_budget: None,
            ..TargetConfig::default()
        };
        assert_eq!(listing.over_budget(&unlimited), None);
    }

    #[test]
    fn deterministic_output() {
        let requests = [direct("one"), shell("two")];
        let a = generate(&requests, &TargetConfig::default());
        let b = generate(&requests, &TargetConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn custom_origin() {
        let target = TargetConfig {
            origin: 0x0600,
            ..TargetConfig::default()
        };
        let listing = generate(&[], &target);
        assert!(
            listing
                .instructions
                .iter()
                .any(|ins| matches!(ins, Instruction::Directive(d) if d == "org 0x0600"))
        );
        assert!(has_op(&listing, "mov", "sp, 0x0600"));
    }
}
