//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Production code MUST NOT block inside async functions.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::io::stdout()` and async
//! reqwest, not their `std` or blocking counterparts.
//!
//! Blocking calls are fine in plain `fn`s that run before the runtime does
//! real work (config loading, CLI setup) and in test code.

use architectural_enforcement::{
    code_part, enclosing_fn, is_test_code, production_sources, FnKind, SourceFile, Violation,
};

/// Test that production code does not use blocking I/O in async context
#[test]
fn test_no_blocking_io_in_production_code() {
    let sources = production_sources();
    assert!(!sources.is_empty(), "No production sources found to scan");

    let violations: Vec<Violation> = sources.iter().flat_map(find_violations).collect();

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O found in async production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nREQUIRED async I/O:");
        eprintln!("  - tokio::fs::read().await, tokio::fs::write().await");
        eprintln!("  - tokio::net::TcpStream::connect().await");
        eprintln!("  - tokio::io::stdout() with AsyncWriteExt");
        eprintln!("  - reqwest::Client (async), never reqwest::blocking");

        panic!(
            "\nFound {} blocking I/O violation(s) in production code.",
            violations.len()
        );
    }
}

fn find_violations(file: &SourceFile) -> Vec<Violation> {
    let lines = file.line_refs();
    let mut violations = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if is_test_code(&lines, idx) {
            continue;
        }
        let code = code_part(line);
        let in_async = enclosing_fn(&lines, idx) == Some(FnKind::Async);
        let in_sync = enclosing_fn(&lines, idx) == Some(FnKind::Sync);

        let mut flag = |reason: &'static str| {
            violations.push(Violation {
                path: file.path.clone(),
                line: idx + 1,
                reason,
                text: line.trim().to_string(),
            });
        };

        // Always wrong, whatever the context
        if code.contains("reqwest::blocking") {
            flag("Blocking HTTP client");
        }

        // Wrong unless confined to a synchronous function
        if !in_sync {
            if code.contains("std::fs::") || code.trim_start().starts_with("use std::fs") {
                flag("Blocking file I/O");
            }
            if code.contains("std::net::") || code.trim_start().starts_with("use std::net") {
                flag("Blocking network I/O");
            }
            if code.contains("std::process::Command") {
                flag("Blocking process I/O");
            }
        }

        if in_async && (code.contains("std::io::stdin()") || code.contains("std::io::stdout()")) {
            flag("Blocking stdin/stdout in async");
        }
    }

    violations
}

#[test]
fn test_detector_flags_fs_in_async_fn() {
    let file = SourceFile::from_text(
        "bad.rs",
        "pub async fn save(&self) {\n    std::fs::write(&path, data)?;\n}\n",
    );
    let violations = find_violations(&file);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].line, 2);
}

#[test]
fn test_detector_allows_fs_in_sync_fn() {
    let file = SourceFile::from_text(
        "config.rs",
        "pub fn load_config() -> Config {\n    std::fs::read_to_string(&path)?;\n}\n",
    );
    assert!(find_violations(&file).is_empty());
}

#[test]
fn test_detector_flags_stdout_in_async_fn() {
    let file = SourceFile::from_text(
        "render.rs",
        "async fn render() {\n    let out = std::io::stdout();\n}\n",
    );
    assert_eq!(find_violations(&file).len(), 1);
}

#[test]
fn test_detector_ignores_test_module() {
    let file = SourceFile::from_text(
        "store.rs",
        "#[cfg(test)]\nmod tests {\n    async fn helper() {\n        std::fs::read(\"x\");\n    }\n}\n",
    );
    assert!(find_violations(&file).is_empty());
}
