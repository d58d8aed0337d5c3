//! Integration Test: Panic Prohibition
//!
//! **Policy**: Production code MUST propagate errors with `?` instead of
//! calling `unwrap()` or `expect()`.
//!
//! **Exceptions**: test code (`#[cfg(test)]` modules and `tests/` directories)

use architectural_enforcement::{is_panicking_unwrap, scan_production_code};

#[test]
fn test_no_unwrap_in_production_code() {
    let violations = scan_production_code(is_panicking_unwrap);

    if !violations.is_empty() {
        eprintln!("\n❌ unwrap()/expect() found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use `?` with anyhow::Context or a thiserror variant instead.");

        panic!(
            "\nFound {} unwrap/expect violation(s) in production code.",
            violations.len()
        );
    }
}
