#![allow(dead_code)]

use longc::{Error, MemoryResolver, TargetConfig, compile_str};

/// Compile with an empty in-memory resolver and default target.
pub fn compile(input: &str) -> Result<String, Error> {
    compile_str(input, &MemoryResolver::new(), &TargetConfig::default())
}

/// Compile with a prepared resolver.
pub fn compile_with(input: &str, resolver: &MemoryResolver) -> Result<String, Error> {
    compile_str(input, resolver, &TargetConfig::default())
}

/// Assert the artifact embeds `text` as a zero-terminated message.
pub fn assert_prints(asm: &str, text: &str) {
    let needle = format!("db \"{text}\", 0");
    assert!(
        asm.contains(&needle),
        "expected artifact to contain {needle:?}:\n{asm}"
    );
}
