#![allow(dead_code)]

use phpfmt_rs::{format, format_str, parse};

/// Assert that `input` is already in canonical layout.
pub fn roundtrip(input: &str) {
    let output = format_str(input).expect("format failed");
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Format `input`, then format the result again and require no change.
pub fn assert_idempotent(input: &str) -> String {
    let file = parse(input).unwrap_or_else(|e| panic!("parse failed: {e}\n--- input ---\n{input}"));
    let once = format(&file).expect("format failed");
    let twice = format_str(&once).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{once}"
        )
    });
    assert_eq!(
        once, twice,
        "formatting is not idempotent\n--- input ---\n{input}"
    );
    once
}
