//! CLI for the Long boot-sector compiler: source file in, NASM
//! assembly file out.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use longc::{FsResolver, TargetConfig, compile_listing, emit};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: longc <source.long> [output.asm]");
        eprintln!();
        eprintln!("Compiles a Long program to NASM boot-sector assembly.");
        eprintln!("The output path defaults to the source path with an");
        eprintln!(".asm extension. Assemble the result with:");
        eprintln!("  nasm -f bin output.asm -o boot.bin");
        return ExitCode::from(2);
    }

    if args.len() > 3 {
        eprintln!("Error: too many arguments");
        return ExitCode::from(2);
    }

    let source_path = Path::new(&args[1]);
    let output_path = args.get(2).map_or_else(
        || source_path.with_extension("asm"),
        PathBuf::from,
    );

    let source = match fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {e}", source_path.display());
            return ExitCode::FAILURE;
        }
    };

    // ReadFile paths resolve relative to the source file.
    let base = source_path.parent().unwrap_or_else(|| Path::new("."));
    let resolver = FsResolver::new(base);
    let target = TargetConfig::default();

    let listing = match compile_listing(&source, &resolver, &target) {
        Ok(listing) => listing,
        Err(e) => {
            eprintln!("{}: {e}", source_path.display());
            return ExitCode::FAILURE;
        }
    };

    if let Some(excess) = listing.over_budget(&target) {
        eprintln!(
            "warning: payload is {} bytes, {excess} over the {}-byte boot sector budget",
            listing.code_bytes,
            target.byte_budget.unwrap_or(0),
        );
    }

    if let Err(e) = fs::write(&output_path, emit(&listing)) {
        eprintln!("{}: {e}", output_path.display());
        return ExitCode::FAILURE;
    }

    eprintln!(
        "{}: wrote {} ({} payload bytes)",
        source_path.display(),
        output_path.display(),
        listing.code_bytes,
    );
    ExitCode::SUCCESS
}
