//! Lightweight structural summary of a code snippet.
//!
//! Also hosts the function/class recognizers shared with the call-graph
//! builder, so both agree on what counts as a named definition.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::complexity::visit_nodes;
use super::language::{Language, new_parser};

/// Name given to definitions whose name node is missing.
pub const ANONYMOUS: &str = "<anon>";

/// A function definition and its 1-based line span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpan {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Token, line, and function summary of a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetSummary {
    pub language: String,
    /// Whitespace-separated token count.
    pub tokens: usize,
    /// Non-empty line count.
    pub loc: usize,
    /// Empty for languages without a bundled grammar.
    pub functions: Vec<FunctionSpan>,
}

impl SnippetSummary {
    /// One-line description used in analysis prompts.
    #[must_use]
    pub fn structure_line(&self) -> String {
        format!(
            "Code Structure: {} functions, {} lines of code",
            self.functions.len(),
            self.loc
        )
    }
}

/// Summarize `content` for `language` (aliases accepted).
#[must_use]
pub fn parse_snippet(language: &str, content: &str) -> SnippetSummary {
    let lang = Language::from_name(language);
    let functions = lang
        .map(|l| function_spans(l, content))
        .unwrap_or_default();

    SnippetSummary {
        language: lang.map_or_else(|| language.to_string(), |l| l.name().to_string()),
        tokens: content.split_whitespace().count(),
        loc: content.lines().filter(|l| !l.trim().is_empty()).count(),
        functions,
    }
}

fn function_spans(language: Language, content: &str) -> Vec<FunctionSpan> {
    let Some(mut parser) = new_parser(language) else {
        return Vec::new();
    };
    let Some(tree) = parser.parse(content, None) else {
        tracing::debug!(language = %language, "Snippet parse failed");
        return Vec::new();
    };

    let mut spans = Vec::new();
    visit_nodes(tree.root_node(), |node| {
        if let Some(name) = function_name(language, node, content) {
            spans.push(FunctionSpan {
                name,
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
            });
        }
    });
    spans
}

// =============================================================================
// Definition recognizers
// =============================================================================

/// If `node` defines a named function or method, return its name.
///
/// Python: `function_definition` (sync and async).
/// JavaScript/TypeScript: function and generator declarations, method
/// definitions, and a variable declarator whose value is an arrow function or
/// function expression.
#[must_use]
pub fn function_name(language: Language, node: Node<'_>, source: &str) -> Option<String> {
    match language {
        Language::Python => {
            (node.kind() == "function_definition").then(|| field_text(node, "name", source))
        }
        Language::JavaScript | Language::TypeScript => match node.kind() {
            "function_declaration" | "generator_function_declaration" | "method_definition" => {
                Some(field_text(node, "name", source))
            }
            "variable_declarator" => {
                let value = node.child_by_field_name("value")?;
                matches!(
                    value.kind(),
                    "arrow_function" | "function_expression" | "function" | "generator_function"
                )
                .then(|| field_text(node, "name", source))
            }
            _ => None,
        },
        Language::Java | Language::Go | Language::Rust => None,
    }
}

/// If `node` defines a named class, return its name.
#[must_use]
pub fn class_name(language: Language, node: Node<'_>, source: &str) -> Option<String> {
    let is_class = match language {
        Language::Python => node.kind() == "class_definition",
        Language::JavaScript | Language::TypeScript => matches!(
            node.kind(),
            "class_declaration" | "abstract_class_declaration"
        ),
        Language::Java | Language::Go | Language::Rust => false,
    };
    is_class.then(|| field_text(node, "name", source))
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> String {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        .map_or_else(|| ANONYMOUS.to_string(), str::to_string)
}
