//! Supported source languages.
//!
//! Central table of language names, aliases, file extensions, and comment
//! prefixes shared by the complexity analyzer, snippet parser, graph builder,
//! and AI analyzer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodieError, Result};

/// Languages accepted by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Go,
    Rust,
}

impl Language {
    /// All languages in display order.
    pub const ALL: &'static [Self] = &[
        Self::Python,
        Self::JavaScript,
        Self::Java,
        Self::TypeScript,
        Self::Go,
        Self::Rust,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Go => "go",
            Self::Rust => "rust",
        }
    }

    /// Resolve a language name or alias, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "python" | "py" => Some(Self::Python),
            "javascript" | "js" => Some(Self::JavaScript),
            "typescript" | "ts" => Some(Self::TypeScript),
            "java" => Some(Self::Java),
            "go" | "golang" => Some(Self::Go),
            "rust" | "rs" => Some(Self::Rust),
            _ => None,
        }
    }

    /// Like [`Language::from_name`] but reports unsupported names as a validation error.
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| CodieError::UnsupportedLanguage(name.to_string()))
    }

    /// Guess a language from a file extension (without the dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Some(Self::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            "java" => Some(Self::Java),
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            _ => None,
        }
    }

    /// Line comment prefix used by the line-count complexity tier.
    #[must_use]
    pub const fn comment_prefix(self) -> &'static str {
        match self {
            Self::Python => "#",
            Self::JavaScript | Self::TypeScript | Self::Java | Self::Go | Self::Rust => "//",
        }
    }

    /// Whether a tree-sitter grammar is bundled for this language.
    #[must_use]
    pub const fn has_structural_parser(self) -> bool {
        matches!(self, Self::Python | Self::JavaScript | Self::TypeScript)
    }

    /// Tree-sitter grammar for this language, when bundled.
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::Java | Self::Go | Self::Rust => None,
        }
    }

    /// Grammar for a file with extension `ext`. `.tsx` files use the
    /// JSX-aware TypeScript grammar.
    #[must_use]
    pub fn file_grammar(self, ext: &str) -> Option<tree_sitter::Language> {
        if self == Self::TypeScript && ext.eq_ignore_ascii_case("tsx") {
            return Some(tree_sitter_typescript::LANGUAGE_TSX.into());
        }
        self.grammar()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Build a tree-sitter parser for `language`, or `None` when no grammar is
/// bundled or the grammar refuses to load.
#[must_use]
pub fn new_parser(language: Language) -> Option<tree_sitter::Parser> {
    parser_with(language, &language.grammar()?)
}

/// Like [`new_parser`], with the grammar picked from `path`'s extension.
#[must_use]
pub fn new_file_parser(language: Language, path: &Path) -> Option<tree_sitter::Parser> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    parser_with(language, &language.file_grammar(ext)?)
}

fn parser_with(language: Language, grammar: &tree_sitter::Language) -> Option<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    match parser.set_language(grammar) {
        Ok(()) => Some(parser),
        Err(e) => {
            tracing::debug!(language = %language, error = %e, "Failed to load grammar");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve() {
        assert_eq!(Language::from_name("JS"), Some(Language::JavaScript));
        assert_eq!(Language::from_name("ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_name(" Python "), Some(Language::Python));
        assert_eq!(Language::from_name("golang"), Some(Language::Go));
        assert_eq!(Language::from_name("cobol"), None);
    }

    #[test]
    fn parse_reports_unsupported() {
        let err = Language::parse("cobol").unwrap_err();
        assert!(matches!(err, CodieError::UnsupportedLanguage(ref l) if l == "cobol"));
    }

    #[test]
    fn grammars_load_for_parsed_languages() {
        for &lang in Language::ALL {
            assert_eq!(new_parser(lang).is_some(), lang.has_structural_parser());
        }
    }

    #[test]
    fn extensions_map_to_languages() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("TSX"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("md"), None);
    }

    #[test]
    fn tsx_files_parse_jsx() {
        let source = "function View() { return <div onClick={() => go()}>hi</div>; }\n";
        let mut tsx = new_file_parser(Language::TypeScript, Path::new("app/View.tsx")).unwrap();
        assert!(!tsx.parse(source, None).unwrap().root_node().has_error());

        let mut ts = new_file_parser(Language::TypeScript, Path::new("app/view.ts")).unwrap();
        assert!(ts.parse(source, None).unwrap().root_node().has_error());
    }
}
