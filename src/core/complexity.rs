//! Language-aware cyclomatic complexity scoring.
//!
//! Three tiers, tried in order:
//! 1. **Structural**: count decision-point nodes in a tree-sitter syntax tree
//!    (Python, JavaScript, TypeScript), plus short-circuit boolean operators.
//! 2. **Lexical**: when the grammar is unavailable or parsing fails, count a
//!    fixed keyword set in the lowercased text.
//! 3. **Lines**: languages without a grammar count non-empty, non-comment lines.
//!
//! Scoring never fails; every failure degrades to the next tier.

use std::path::Path;

use tree_sitter::{Node, Parser};

use super::language::{Language, new_file_parser, new_parser};

/// Node kinds counted as decision points in Python.
const PYTHON_DECISIONS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "conditional_expression",
];

/// Node kinds counted as decision points in JavaScript and TypeScript.
const JS_DECISIONS: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "catch_clause",
    "ternary_expression",
    "switch_case",
    "switch_default",
];

/// Keywords counted by the lexical tier.
const LEXICAL_KEYWORDS: &[&str] = &["if", "for", "while", "and", "or", "elif", "except", "?"];

/// Comment prefix for languages the analyzer does not recognize.
const DEFAULT_COMMENT_PREFIX: &str = "#";

/// Compute complexity for a language given by name (aliases accepted).
///
/// Unknown languages are scored by counting non-empty lines that do not start
/// with `#`.
#[must_use]
pub fn compute_complexity(language: &str, source: &str) -> u32 {
    Language::from_name(language).map_or_else(
        || line_complexity(source, DEFAULT_COMMENT_PREFIX),
        |lang| complexity_of(lang, source),
    )
}

/// Compute complexity for a known language.
#[must_use]
pub fn complexity_of(language: Language, source: &str) -> u32 {
    score(language, source, || new_parser(language))
}

/// Complexity of code taken from the file at `path`, parsed with the
/// grammar its extension calls for.
#[must_use]
pub fn complexity_in_file(language: Language, path: &Path, source: &str) -> u32 {
    score(language, source, || new_file_parser(language, path))
}

fn score(language: Language, source: &str, parser: impl FnOnce() -> Option<Parser>) -> u32 {
    if language.has_structural_parser() {
        parser()
            .and_then(|parser| structural_complexity(language, source, parser))
            .unwrap_or_else(|| {
                tracing::debug!(language = %language, "Structural parse unavailable, using keyword scan");
                lexical_complexity(source)
            })
    } else {
        line_complexity(source, language.comment_prefix())
    }
}

/// Tier 1: syntax-tree decision points + 1.
fn structural_complexity(language: Language, source: &str, mut parser: Parser) -> Option<u32> {
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();

    let hits = match language {
        Language::Python => {
            let lower = source.to_lowercase();
            let boolean_ops = lower.matches(" and ").count() + lower.matches(" or ").count();
            count_kinds(root, PYTHON_DECISIONS) + to_u32(boolean_ops)
        }
        _ => count_kinds(root, JS_DECISIONS) + count_js_logical_operators(root),
    };

    Some(1 + hits)
}

/// Tier 2: keyword occurrences + 1. Empty text scores 0.
#[must_use]
pub fn lexical_complexity(source: &str) -> u32 {
    if source.is_empty() {
        return 0;
    }
    let lower = source.to_lowercase();
    let hits: usize = LEXICAL_KEYWORDS
        .iter()
        .map(|keyword| lower.matches(keyword).count())
        .sum();
    1 + to_u32(hits)
}

/// Tier 3: non-empty lines that are not line comments.
#[must_use]
pub fn line_complexity(source: &str, comment_prefix: &str) -> u32 {
    let count = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(comment_prefix))
        .count();
    to_u32(count)
}

/// Count branch-like nodes under `node` for the graph builder's fallback path:
/// conditionals, loops, boolean operators, and try blocks, plus one.
#[must_use]
pub fn structural_node_count(language: Language, node: Node<'_>) -> u32 {
    let kinds: &[&str] = match language {
        Language::Python => &[
            "if_statement",
            "for_statement",
            "while_statement",
            "boolean_operator",
            "try_statement",
        ],
        _ => &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
            "try_statement",
        ],
    };
    let logical = if language == Language::Python {
        0
    } else {
        count_js_logical_operators(node)
    };
    1 + count_kinds(node, kinds) + logical
}

fn count_kinds(root: Node<'_>, kinds: &[&str]) -> u32 {
    let mut hits = 0;
    visit_nodes(root, |node| {
        if kinds.contains(&node.kind()) {
            hits += 1;
        }
    });
    hits
}

/// `&&` and `||` appear as `binary_expression` nodes with an operator field.
fn count_js_logical_operators(root: Node<'_>) -> u32 {
    let mut hits = 0;
    visit_nodes(root, |node| {
        if node.kind() == "binary_expression"
            && node
                .child_by_field_name("operator")
                .is_some_and(|op| matches!(op.kind(), "&&" | "||"))
        {
            hits += 1;
        }
    });
    hits
}

/// Pre-order traversal of every node under `root` without recursion.
pub(crate) fn visit_nodes<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
