//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the bridge core and CLI MUST NOT call sleep
//! methods. A waiting consumer waits on the queue with a bounded receive;
//! paced producers use `tokio::time::interval`.
//!
//! **Exceptions**: test code (`#[cfg(test)]` modules and `tests/` directories)

use architectural_enforcement::{is_sleep_call, scan_production_code, workspace_root};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan_production_code(is_sleep_call);

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n✅ ACCEPTABLE instead of sleep:");
        eprintln!("  - Bounded channel receives (recv_timeout, tokio::time::timeout)");
        eprintln!("  - Periodic tasks using tokio::time::interval()");
        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - Sleep in polling loops");
        eprintln!("  - Sleep as poor man's synchronization");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

/// The scan must actually see the bridge sources, or it proves nothing
#[test]
fn test_production_sources_are_found() {
    let bridge = workspace_root().join("bridge/core/src/streaming/bridge.rs");
    assert!(bridge.exists(), "expected {} to exist", bridge.display());
}
