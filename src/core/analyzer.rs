//! AI-assisted code analysis.
//!
//! Validates input, serves cached results, builds a context prompt from the
//! snippet's structure and complexity, delegates to the provider manager, and
//! post-processes the answer. Any pipeline failure, or no provider answering,
//! degrades to heuristic suggestions; those are never cached.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::complexity::complexity_of;
use super::fallback::fallback_suggestions;
use super::language::Language;
use super::manager::ProviderManager;
use super::parser::parse_snippet;
use super::provider::ProviderStatus;
use super::token_usage::TokenCounts;
use crate::error::{CodieError, Result};
use crate::storage::{CacheStats, ResolvedConfig, ResultCache, cache_key};

/// Suggestions shorter than this (in chars) are dropped.
const MIN_SUGGESTION_CHARS: usize = 10;

/// Below this complexity the prompt asks for optimization and edge cases.
const LOW_COMPLEXITY: u32 = 3;

/// Substrings that mark a suggestion as high impact.
const HIGH_IMPACT_KEYWORDS: &[&str] = &[
    "security",
    "vulnerability",
    "performance",
    "memory leak",
    "race condition",
    "deadlock",
    "buffer overflow",
    "sql injection",
    "refactor",
    "simplify",
    "optimize",
    "critical",
];

/// One leading bullet or list number.
static SUGGESTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-•*]|\d+[.)])\s+").expect("suggestion prefix regex"));

// =============================================================================
// Analysis Type
// =============================================================================

/// Focus of an analysis. Unknown names are treated as general.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    General,
    Security,
    Performance,
    Maintainability,
}

impl AnalysisType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Maintainability => "maintainability",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "security" => Self::Security,
            "performance" => Self::Performance,
            "maintainability" => Self::Maintainability,
            _ => Self::General,
        }
    }

    const fn guidance(self) -> &'static str {
        match self {
            Self::Security => {
                "Focus on security vulnerabilities, input validation, and secure coding practices"
            }
            Self::Performance => {
                "Focus on performance optimization, memory usage, and algorithmic efficiency"
            }
            Self::Maintainability => "Focus on code structure, readability, and maintainability",
            Self::General => "Focus on general code quality, best practices, and improvements",
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Settings and metrics
// =============================================================================

/// Filtering knobs for post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerSettings {
    /// Above this complexity every suggestion is kept.
    pub high_complexity_threshold: u32,
    pub max_suggestions: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            high_complexity_threshold: 7,
            max_suggestions: 5,
        }
    }
}

/// Snapshot of analyzer and provider state.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetrics {
    pub ai_providers: Vec<ProviderStatus>,
    pub token_usage: BTreeMap<String, TokenCounts>,
    pub cache_stats: CacheStats,
    /// Analyses that passed validation.
    pub analysis_count: u64,
    pub last_cleanup: DateTime<Utc>,
}

// =============================================================================
// Analyzer
// =============================================================================

#[derive(Debug)]
pub struct AiAnalyzer {
    manager: Arc<ProviderManager>,
    cache: ResultCache,
    settings: AnalyzerSettings,
    analyses: AtomicU64,
}

impl AiAnalyzer {
    #[must_use]
    pub const fn new(manager: Arc<ProviderManager>, cache: ResultCache, settings: AnalyzerSettings) -> Self {
        Self {
            manager,
            cache,
            settings,
            analyses: AtomicU64::new(0),
        }
    }

    /// Analyzer with cache and filtering taken from configuration.
    #[must_use]
    pub fn from_config(manager: Arc<ProviderManager>, config: &ResolvedConfig) -> Self {
        let analysis = &config.config.analysis;
        Self::new(
            manager,
            ResultCache::new(
                config.cache_ttl,
                std::time::Duration::from_secs(analysis.cleanup_interval_seconds),
            ),
            AnalyzerSettings {
                high_complexity_threshold: analysis.high_complexity_threshold,
                max_suggestions: analysis.max_suggestions,
            },
        )
    }

    #[must_use]
    pub const fn manager(&self) -> &Arc<ProviderManager> {
        &self.manager
    }

    /// Analyze `code` and return improvement suggestions.
    ///
    /// # Errors
    ///
    /// Only validation errors: empty code or an unsupported language. Every
    /// other failure yields heuristic suggestions.
    pub async fn analyze_code(
        &self,
        code: &str,
        language: &str,
        show_all: bool,
        analysis_type: AnalysisType,
    ) -> Result<Vec<String>> {
        if code.trim().is_empty() {
            return Err(CodieError::EmptyCode);
        }
        let lang = Language::parse(language)?;
        self.analyses.fetch_add(1, Ordering::Relaxed);

        let key = cache_key(lang.name(), analysis_type.as_str(), show_all, code);
        if let Some(cached) = self.cache.get(&key) {
            tracing::info!(language = %lang, analysis_type = %analysis_type, "Returning cached analysis");
            return Ok(cached);
        }

        let complexity = complexity_of(lang, code);
        match self.run_pipeline(code, lang, complexity, show_all, analysis_type).await {
            Ok(Some(suggestions)) => {
                self.cache.insert(key, suggestions.clone());
                if let Some(removed) = self.cache.maybe_sweep() {
                    tracing::debug!(removed, "Cleaned up expired cache entries");
                }
                Ok(suggestions)
            }
            Ok(None) => {
                tracing::warn!(language = %lang, "No AI suggestions received, using heuristics");
                Ok(self.fallback(code, lang, complexity))
            }
            Err(e) => {
                tracing::error!(language = %lang, error = %e, "Code analysis failed, using heuristics");
                Ok(self.fallback(code, lang, complexity))
            }
        }
    }

    /// `Ok(None)` when no provider produced anything.
    async fn run_pipeline(
        &self,
        code: &str,
        lang: Language,
        complexity: u32,
        show_all: bool,
        analysis_type: AnalysisType,
    ) -> Result<Option<Vec<String>>> {
        let prompt = self.build_prompt(code, lang, complexity, show_all, analysis_type);
        let raw = self.manager.get_suggestions(&prompt, lang.name()).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.process_suggestions(&raw, complexity, show_all)))
    }

    /// Context prompt sent to providers.
    #[must_use]
    pub fn build_prompt(
        &self,
        code: &str,
        lang: Language,
        complexity: u32,
        show_all: bool,
        analysis_type: AnalysisType,
    ) -> String {
        let summary = parse_snippet(lang.name(), code);
        let mut parts = vec![
            format!("Language: {lang}"),
            format!("Code Complexity: {complexity}/10"),
            format!("Analysis Type: {analysis_type}"),
            format!("Show All: {show_all}"),
            summary.structure_line(),
            analysis_type.guidance().to_string(),
        ];

        if complexity > self.settings.high_complexity_threshold {
            parts.push("High complexity detected - prioritize simplification and refactoring".to_string());
        } else if complexity < LOW_COMPLEXITY {
            parts.push("Low complexity - focus on optimization and edge cases".to_string());
        }

        parts.push(format!("\nCode:\n{code}"));
        parts.join("\n")
    }

    /// Trim, drop short lines, strip one list marker, filter by impact, cap.
    #[must_use]
    pub fn process_suggestions(&self, raw: &[String], complexity: u32, show_all: bool) -> Vec<String> {
        let mut processed = Vec::new();
        for suggestion in raw {
            let trimmed = suggestion.trim();
            if trimmed.chars().count() < MIN_SUGGESTION_CHARS {
                continue;
            }
            let cleaned = SUGGESTION_PREFIX.replace(trimmed, "").into_owned();

            if show_all || self.is_high_impact(&cleaned, complexity) {
                processed.push(cleaned);
            }
            if processed.len() >= self.settings.max_suggestions {
                break;
            }
        }
        processed
    }

    fn is_high_impact(&self, suggestion: &str, complexity: u32) -> bool {
        let lower = suggestion.to_lowercase();
        HIGH_IMPACT_KEYWORDS.iter().any(|k| lower.contains(k))
            || complexity > self.settings.high_complexity_threshold
    }

    fn fallback(&self, code: &str, lang: Language, complexity: u32) -> Vec<String> {
        fallback_suggestions(code, lang, complexity, self.settings.high_complexity_threshold)
    }

    /// Provider, token, and cache state.
    #[must_use]
    pub fn analysis_metrics(&self) -> AnalysisMetrics {
        let cache_stats = self.cache.stats();
        AnalysisMetrics {
            ai_providers: self.manager.provider_status(),
            token_usage: self.manager.token_usage(),
            last_cleanup: cache_stats.last_sweep,
            cache_stats,
            analysis_count: self.analyses.load(Ordering::Relaxed),
        }
    }
}
