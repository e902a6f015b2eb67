//! Heuristic suggestions used when no provider answers.
//!
//! Pure pattern checks over the raw code; at most three results, never
//! empty.

use super::language::Language;

/// Most fallback suggestions returned.
pub const MAX_FALLBACK_SUGGESTIONS: usize = 3;

/// Files longer than this many lines get a split-file suggestion.
const LARGE_FILE_LINES: usize = 50;

const GENERIC: &str = "Review code for potential improvements in readability and maintainability";

/// Deterministic, language-specific suggestions for `code`.
///
/// `threshold` is the complexity above which structure-level advice is given.
#[must_use]
pub fn fallback_suggestions(
    code: &str,
    language: Language,
    complexity: u32,
    threshold: u32,
) -> Vec<String> {
    let complex = complexity > threshold;
    let mut out: Vec<&str> = Vec::new();

    match language {
        Language::Python => {
            if complex {
                out.push("Consider breaking down complex functions into smaller, more focused functions");
            }
            if code.contains("def ") && !code.contains("class ") {
                out.push("Consider organizing code into classes for better structure");
            }
            if code.contains("import *") {
                out.push("Avoid wildcard imports - import only what you need");
            }
            if code.contains("def ") && !code.contains("->") {
                out.push("Add type hints to function signatures for better clarity");
            }
        }
        Language::JavaScript | Language::TypeScript => {
            if complex {
                out.push("Consider using early returns to reduce nesting and complexity");
            }
            if code.contains("var ") {
                out.push("Use 'const' or 'let' instead of 'var' for better scoping");
            }
            if code.contains("function(") {
                out.push("Consider using arrow functions for consistency");
            }
        }
        Language::Java => {
            if complex {
                out.push("Consider extracting complex logic into separate methods");
            }
            if code.contains("public static void main") {
                out.push("Consider separating business logic from the main method");
            }
        }
        Language::Go => {
            if ignores_go_error(code) {
                out.push("Handle returned errors instead of discarding them with '_'");
            }
        }
        Language::Rust => {
            if code.contains(".unwrap()") {
                out.push("Replace .unwrap() with proper error handling using ? or match");
            }
        }
    }

    if code.lines().count() > LARGE_FILE_LINES {
        out.push("Consider breaking large files into smaller, focused modules");
    }
    if out.is_empty() {
        out.push(GENERIC);
    }

    out.into_iter()
        .take(MAX_FALLBACK_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

/// `v, _ := f()` or `_ = f()` style discards.
fn ignores_go_error(code: &str) -> bool {
    code.lines().map(str::trim).any(|line| {
        line.contains(", _ :=") || line.contains(", _ =") || line.starts_with("_ =")
    })
}
