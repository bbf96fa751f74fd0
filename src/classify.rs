//! Path segmentation, display names and hidden-path matching.

use crate::error::{Result, WorkbenchError};
use globset::{Glob, GlobMatcher};
use regex::Regex;

/// Path patterns hidden from every tree: dependency and framework build directories.
pub const DEFAULT_HIDDEN_PATTERNS: &[&str] = &[r"/node_modules/", r"/\.next", r"/\.astro"];

/// The parts of a path the tree view needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub segments: Vec<String>,
    pub name: String,
    pub extension: String,
}

/// A rule that hides matching paths from the tree.
#[derive(Debug, Clone)]
pub enum HiddenPattern {
    /// Exact match against the last path segment.
    Name(String),
    /// Regex searched in the full path.
    Regex(Regex),
    /// Glob matched against the full path.
    Glob(GlobMatcher),
}

impl HiddenPattern {
    pub fn name(name: impl Into<String>) -> Self {
        HiddenPattern::Name(name.into())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(HiddenPattern::Regex)
            .map_err(|e| WorkbenchError::pattern(pattern, e))
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        Glob::new(pattern)
            .map(|glob| HiddenPattern::Glob(glob.compile_matcher()))
            .map_err(|e| WorkbenchError::pattern(pattern, e))
    }

    pub fn matches(&self, path: &str, name: &str) -> bool {
        match self {
            HiddenPattern::Name(n) => n == name,
            HiddenPattern::Regex(re) => re.is_match(path),
            HiddenPattern::Glob(glob) => glob.is_match(path),
        }
    }
}

/// Returns the built-in hidden patterns.
pub fn default_hidden_patterns() -> Vec<HiddenPattern> {
    DEFAULT_HIDDEN_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok().map(HiddenPattern::Regex))
        .collect()
}

/// Splits a path on `/`, dropping empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Splits a path into its segments, display name and lower-cased extension.
pub fn classify(path: &str) -> Classified {
    let segments: Vec<String> = segments(path).into_iter().map(str::to_string).collect();
    let name = segments.last().cloned().unwrap_or_default();
    let extension = extension(&name);
    Classified {
        segments,
        name,
        extension,
    }
}

/// The text after the last `.` of `name`, lower-cased.
///
/// Names without a dot past the first character (`Makefile`, `.env`) have no extension.
pub fn extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx + 1..].to_lowercase(),
        _ => String::new(),
    }
}

pub fn is_hidden(path: &str, name: &str, patterns: &[HiddenPattern]) -> bool {
    patterns.iter().any(|p| p.matches(path, name))
}

/// Code fence language for a file extension.
pub fn language_for_extension(ext: &str) -> &'static str {
    match ext {
        "rs" => "rust", "toml" => "toml", "json" => "json", "md" | "markdown" => "markdown",
        "txt" => "text", "html" | "htm" => "html", "css" => "css", "scss" => "scss",
        "js" | "mjs" | "cjs" => "javascript", "jsx" => "jsx", "ts" => "typescript", "tsx" => "tsx",
        "py" => "python", "sh" | "bash" => "bash", "yml" | "yaml" => "yaml", "xml" => "xml",
        "c" => "c", "cpp" | "cc" | "cxx" => "cpp", "h" => "c", "hpp" => "cpp",
        "go" => "go", "rb" => "ruby", "php" => "php", "swift" => "swift",
        "kt" | "kts" => "kotlin", "java" => "java", "cs" => "csharp", "svg" => "xml",
        _ => "",
    }
}
