//! Suggestion backends.
//!
//! Each remote provider has its own submodule; all share the suggestion line
//! cleanup below.

use std::sync::LazyLock;

use regex::Regex;

pub mod gemini;
pub mod huggingface;
pub mod mock;

pub use gemini::GeminiBackend;
pub use huggingface::HuggingFaceBackend;
pub use mock::MockBackend;

/// Most suggestions a provider returns.
pub const MAX_SUGGESTIONS: usize = 5;

/// Lines this short (in chars) or shorter are dropped.
const MIN_LINE_CHARS: usize = 10;

/// Leading bullets (`-`, `•`, `*`) or list numbers (`1.`, `2)`).
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-•*]+|\d+[.)])\s*").expect("list marker regex"));

/// Build the instruction sent to remote providers.
#[must_use]
pub fn suggestion_prompt(code: &str, language: &str, instructions: &str) -> String {
    format!("Language: {language}\nCode:\n{code}\n\nSuggest 3-5 concise code improvements {instructions}")
}

/// Split generated text into cleaned suggestion lines.
///
/// Markers are stripped, lines of ten characters or fewer are dropped.
#[must_use]
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .filter(|line| line.chars().count() > MIN_LINE_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_stripped() {
        let text = "- Use descriptive variable names\n• Add error handling here\n* Prefer iterators over loops\n1. Extract the parsing logic\n2) Cache the compiled regex";
        assert_eq!(
            clean_lines(text),
            vec![
                "Use descriptive variable names",
                "Add error handling here",
                "Prefer iterators over loops",
                "Extract the parsing logic",
                "Cache the compiled regex",
            ]
        );
    }

    #[test]
    fn short_and_blank_lines_are_dropped() {
        let text = "\n- short\n\n0123456789\n01234567890\n";
        assert_eq!(clean_lines(text), vec!["01234567890"]);
    }

    #[test]
    fn prompt_carries_language_and_code() {
        let prompt = suggestion_prompt("x = 1", "python", "(one sentence each).");
        assert!(prompt.starts_with("Language: python\nCode:\nx = 1\n\n"));
        assert!(prompt.ends_with("improvements (one sentence each)."));
    }
}
