//! Analysis engine: complexity scoring, provider fallback, and call graphs.

pub mod analyzer;
pub mod circuit_breaker;
pub mod complexity;
pub mod fallback;
pub mod graph;
pub mod http;
pub mod language;
pub mod logging;
pub mod manager;
pub mod models;
pub mod parser;
pub mod provider;
pub mod refactor;
pub mod token_usage;

pub use analyzer::{AiAnalyzer, AnalysisMetrics, AnalysisType, AnalyzerSettings};
pub use circuit_breaker::{BreakerSettings, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use complexity::{complexity_of, compute_complexity};
pub use graph::{CallGraph, GraphBuilder, GraphEdge, GraphNode, Hotspot, build_graph};
pub use language::Language;
pub use manager::ProviderManager;
pub use parser::{FunctionSpan, SnippetSummary, parse_snippet};
pub use provider::{ProviderConfig, ProviderHandle, ProviderKind, ProviderStatus, SuggestionBackend};
pub use refactor::{RefactorAction, RefactorPlan, RefactorSuggestion, build_refactor_plan, plan_from_graph};
pub use token_usage::{TokenCounts, TokenUsageTracker};
