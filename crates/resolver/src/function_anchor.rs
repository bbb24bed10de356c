//! Function-name detection for anchor lines.
//!
//! Purely textual: a handful of definition-line patterns across common
//! languages. The detected name is informational metadata on a shard, never
//! an input to resolution ranking.

use once_cell::sync::Lazy;
use regex::Regex;

static FUNC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Python
        r"^\s*(async\s+)?def\s+(\w+)\s*\(",
        // JS/TS
        r"^\s*(export\s+)?(async\s+)?function\s+(\w+)\s*\(",
        // Rust
        r"^\s*(pub\s+)?(async\s+)?fn\s+(\w+)\s*[\(<]",
        // Java/C#
        r"^\s*(public|private|protected|static|\s)+[\w<>\[\]]+\s+(\w+)\s*\(",
        // Go
        r"^\s*func\s+(\w+)\s*\(",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static definition pattern"))
    .collect()
});

/// Try to extract a function name from a line that looks like a definition.
/// Returns the last non-empty capture of the first matching pattern.
pub fn detect_function_name(line: &str) -> Option<String> {
    for pattern in FUNC_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(line) {
            let name = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .last();
            if let Some(name) = name {
                return Some(name.to_string());
            }
        }
    }
    None
}
