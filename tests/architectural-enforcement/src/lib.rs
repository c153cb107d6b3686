//! Architectural Enforcement
//!
//! Source-scanning helpers shared by the enforcement tests in `tests/`:
//! - No sleep() calls in production code
//! - No blocking I/O inside async functions
//!
//! The scanners are line based. They understand function signatures with
//! visibility prefixes, `#[test]` functions, and `#[cfg(test)]` modules,
//! which is enough for the code in this workspace.

use std::fmt;
use std::path::{Path, PathBuf};

/// Production source roots, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["chatbox/core/src", "chatbox/cli/src"];

/// Workspace root (two levels above this crate)
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// A Rust source file loaded for scanning
#[derive(Debug)]
pub struct SourceFile {
    /// Path of the file
    pub path: PathBuf,
    /// File contents, one entry per line
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Build from in-memory text
    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Lines as string slices
    #[must_use]
    pub fn line_refs(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }
}

/// Load every `.rs` file under the production roots
#[must_use]
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    let mut files = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.path().extension().and_then(|s| s.to_str()) != Some("rs") {
                continue;
            }
            if let Ok(text) = std::fs::read_to_string(entry.path()) {
                files.push(SourceFile::from_text(entry.path(), &text));
            }
        }
    }

    files
}

/// A rule violation at one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the violation is in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What rule was broken
    pub reason: &'static str,
    /// The offending line, trimmed
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.reason,
            self.text
        )
    }
}

/// The part of a line before any `//` comment
///
/// URLs inside string literals are cut too; that only ever hides code.
#[must_use]
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Kind of function a signature line declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnKind {
    /// `fn`
    Sync,
    /// `async fn`
    Async,
}

/// Classify a line as a function signature, if it is one
#[must_use]
pub fn fn_kind(line: &str) -> Option<FnKind> {
    let mut rest = line.trim();

    if let Some(after) = rest.strip_prefix("pub") {
        rest = match after.strip_prefix('(') {
            // pub(crate), pub(super), pub(in path)
            Some(scoped) => scoped.split_once(')')?.1.trim_start(),
            None => after.trim_start(),
        };
    }
    for qualifier in ["const ", "unsafe ", "extern \"C\" "] {
        if let Some(after) = rest.strip_prefix(qualifier) {
            rest = after.trim_start();
        }
    }

    if rest.starts_with("async fn ") {
        Some(FnKind::Async)
    } else if rest.starts_with("fn ") {
        Some(FnKind::Sync)
    } else {
        None
    }
}

/// Kind of the function enclosing line `idx`
///
/// Scans backwards to the nearest signature; `impl` and `mod` lines end the
/// search.
#[must_use]
pub fn enclosing_fn(lines: &[&str], idx: usize) -> Option<FnKind> {
    for i in (0..=idx).rev() {
        if let Some(kind) = fn_kind(lines[i]) {
            return Some(kind);
        }
        let line = lines[i].trim();
        if line.starts_with("mod ") || line.starts_with("pub mod ") || line.starts_with("impl") {
            return None;
        }
    }
    None
}

/// Whether line `idx` belongs to test code
///
/// Everything after a `#[cfg(test)]` attribute counts, as does any function
/// marked `#[test]` or `#[tokio::test]`.
#[must_use]
pub fn is_test_code(lines: &[&str], idx: usize) -> bool {
    if lines[..idx]
        .iter()
        .any(|l| l.trim().starts_with("#[cfg(test)]"))
    {
        return true;
    }

    let Some(fn_idx) = (0..=idx).rev().find(|&i| fn_kind(lines[i]).is_some()) else {
        return false;
    };
    for line in lines[..fn_idx].iter().rev() {
        let line = line.trim();
        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }
        if !line.starts_with("#[") && !line.starts_with("///") {
            break;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_kind_handles_visibility() {
        assert_eq!(fn_kind("fn main() {"), Some(FnKind::Sync));
        assert_eq!(fn_kind("    pub fn load() -> Config {"), Some(FnKind::Sync));
        assert_eq!(fn_kind("pub(crate) async fn run(&self) {"), Some(FnKind::Async));
        assert_eq!(fn_kind("    async fn upload(&self) {"), Some(FnKind::Async));
        assert_eq!(fn_kind("pub const fn id() -> u8 {"), Some(FnKind::Sync));
        assert_eq!(fn_kind("let f = |x| x + 1;"), None);
        assert_eq!(fn_kind("// fn commented()"), None);
    }

    #[test]
    fn test_enclosing_fn() {
        let code = [
            "impl Loader {",
            "    pub fn load() {",
            "        std::fs::read_to_string(\"a\");",
            "    }",
            "    pub async fn fetch() {",
            "        std::fs::read_to_string(\"b\");",
            "    }",
            "}",
        ];
        assert_eq!(enclosing_fn(&code, 2), Some(FnKind::Sync));
        assert_eq!(enclosing_fn(&code, 5), Some(FnKind::Async));
        assert_eq!(enclosing_fn(&code, 0), None);
    }

    #[test]
    fn test_test_code_detection() {
        let code = [
            "async fn prod() {}",
            "#[tokio::test]",
            "async fn test_it() {",
            "    tokio::time::sleep(d).await;",
            "}",
            "#[cfg(test)]",
            "mod tests {",
            "    fn helper() {}",
            "}",
        ];
        assert!(!is_test_code(&code, 0));
        assert!(is_test_code(&code, 3));
        assert!(is_test_code(&code, 7));
    }

    #[test]
    fn test_code_part_strips_comments() {
        assert_eq!(code_part("let x = 1; // std::fs::read"), "let x = 1; ");
    }
}
