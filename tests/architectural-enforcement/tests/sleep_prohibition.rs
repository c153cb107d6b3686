//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Streams are
//! driven by I/O readiness and the store notifies renderers through a watch
//! channel, so nothing ever needs to poll.
//! **Exceptions**: test code, periodic tasks built on `tokio::time::interval`.

use architectural_enforcement::{code_part, is_test_code, production_sources, SourceFile, Violation};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let sources = production_sources();
    assert!(!sources.is_empty(), "No production sources found to scan");

    let violations: Vec<Violation> = sources.iter().flat_map(find_sleep_violations).collect();

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nACCEPTABLE: test code, tokio::time::interval() for periodic work");
        eprintln!("FORBIDDEN: sleep in polling loops, sleep as synchronization");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

fn find_sleep_violations(file: &SourceFile) -> Vec<Violation> {
    let lines = file.line_refs();

    lines
        .iter()
        .enumerate()
        .filter(|(idx, line)| {
            let code = code_part(line);
            (code.contains("::sleep(") || code.contains(".sleep("))
                && !is_test_code(&lines, *idx)
                && !is_interval_pattern(&lines, *idx)
        })
        .map(|(idx, line)| Violation {
            path: file.path.clone(),
            line: idx + 1,
            reason: "Sleep call",
            text: line.trim().to_string(),
        })
        .collect()
}

/// Whether the sleep sits next to a `tokio::time::interval` tick loop
fn is_interval_pattern(lines: &[&str], idx: usize) -> bool {
    let start = idx.saturating_sub(20);
    let end = (idx + 5).min(lines.len());
    lines[start..end]
        .iter()
        .any(|l| l.contains("interval.tick()") || l.contains("tokio::time::interval"))
}

#[test]
fn test_detector_flags_sleep() {
    let file = SourceFile::from_text(
        "poll.rs",
        "async fn wait_for_reply() {\n    tokio::time::sleep(Duration::from_millis(10)).await;\n}\n",
    );
    assert_eq!(find_sleep_violations(&file).len(), 1);
}

#[test]
fn test_detector_allows_sleep_in_tests() {
    let file = SourceFile::from_text(
        "poll.rs",
        "#[tokio::test]\nasync fn test_slow() {\n    tokio::time::sleep(d).await;\n}\n",
    );
    assert!(find_sleep_violations(&file).is_empty());
}

#[test]
fn test_detector_allows_interval_loops() {
    let file = SourceFile::from_text(
        "tick.rs",
        "async fn tick() {\n    let mut interval = tokio::time::interval(d);\n    loop {\n        interval.tick().await;\n        std::thread::sleep(d);\n    }\n}\n",
    );
    assert!(find_sleep_violations(&file).is_empty());
}
