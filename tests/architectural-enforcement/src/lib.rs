//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code (wait on channels, not on clocks)
//! - No unwrap()/expect() in production code (propagate errors instead)
//!
//! These tests are designed to catch violations early in the development cycle.
//! The helpers below are shared by the test files in `tests/`.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: [&str; 2] = ["bridge/core/src", "bridge/cli/src"];

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the violation
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root (two levels above this crate's manifest)
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// All `.rs` files under `dir`
#[must_use]
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Lines of production code: everything before the first `#[cfg(test)]`,
/// with comment lines removed and trailing comments cut off
///
/// Returns `(line_number, code)` pairs with 1-based line numbers.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
        .collect()
}

/// Scan every production directory for lines matching `is_violation`
#[must_use]
pub fn scan_production_code(is_violation: impl Fn(&str) -> bool) -> Vec<Violation> {
    let root = workspace_root();
    let mut violations = Vec::new();

    for dir in PRODUCTION_DIRS {
        for path in rust_files(&root.join(dir)) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            for (line, code) in production_lines(&content) {
                if is_violation(code) {
                    violations.push(Violation {
                        path: path.clone(),
                        line,
                        text: code.trim().to_string(),
                    });
                }
            }
        }
    }

    violations
}

/// Whether a line calls a sleep function
#[must_use]
pub fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(") || code.contains("sleep_until(")
}

/// Whether a line unwraps a `Result` or `Option` with a panic
#[must_use]
pub fn is_panicking_unwrap(code: &str) -> bool {
    code.contains(".unwrap()") || code.contains(".expect(")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_detection() {
        assert!(is_sleep_call("    tokio::time::sleep(Duration::from_millis(10)).await;"));
        assert!(is_sleep_call("std::thread::sleep(d);"));
        assert!(!is_sleep_call("self.rx.recv_timeout(slice)"));
        assert!(!is_sleep_call("interval.tick().await;"));
    }

    #[test]
    fn test_unwrap_detection() {
        assert!(is_panicking_unwrap("let x = y.unwrap();"));
        assert!(is_panicking_unwrap("let x = y.expect(\"boom\");"));
        assert!(!is_panicking_unwrap("let x = y.unwrap_or_default();"));
        assert!(!is_panicking_unwrap("let x = y.unwrap_or_else(|_| 0);"));
    }

    #[test]
    fn test_production_lines_stop_at_tests() {
        let content = "fn a() {}\n// x.unwrap()\nfn b() { c() } // d.unwrap()\n#[cfg(test)]\nmod tests { fn t() { x.unwrap(); } }\n";
        let lines = production_lines(content);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (1, "fn a() {}"));
        assert_eq!(lines[1], (3, "fn b() { c() } "));
        assert!(lines.iter().all(|(_, code)| !is_panicking_unwrap(code)));
    }
}
