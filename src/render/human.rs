//! Human-readable plain-text output.

use std::fmt::Write as _;

use crate::core::graph::CallGraph;
use crate::core::models::{AnalysisPayload, ComplexityPayload, ProvidersPayload};
use crate::core::refactor::RefactorPlan;
use crate::error::CodieError;

/// Hotspots listed in the graph summary.
const GRAPH_SUMMARY_HOTSPOTS: usize = 10;

// Writes into a String are infallible.

#[must_use]
pub fn render_analysis(payload: &AnalysisPayload) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{} ({}, {} analysis, complexity {})",
        payload.source, payload.language, payload.analysis_type, payload.complexity
    )
    .ok();
    if payload.suggestions.is_empty() {
        out.push_str("  No high-impact suggestions. Use --show-all to see everything.\n");
    }
    for (i, suggestion) in payload.suggestions.iter().enumerate() {
        writeln!(out, "  {}. {suggestion}", i + 1).ok();
    }
    out
}

#[must_use]
pub fn render_complexity(payload: &ComplexityPayload) -> String {
    let mut out = String::new();
    writeln!(out, "{} ({})", payload.source, payload.language).ok();
    writeln!(out, "  Complexity: {}", payload.complexity).ok();
    writeln!(
        out,
        "  Lines: {}  Tokens: {}  Functions: {}",
        payload.structure.loc,
        payload.structure.tokens,
        payload.structure.functions.len()
    )
    .ok();
    for f in &payload.structure.functions {
        writeln!(out, "    {} (lines {}-{})", f.name, f.start_line, f.end_line).ok();
    }
    out
}

#[must_use]
pub fn render_graph(graph: &CallGraph) -> String {
    if graph.is_empty() {
        return "No functions found.\n".to_string();
    }
    let mut out = String::new();
    writeln!(
        out,
        "Call graph: {} functions, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    )
    .ok();
    out.push_str("\nHotspots:\n");
    for hotspot in graph.hotspots.iter().take(GRAPH_SUMMARY_HOTSPOTS) {
        writeln!(out, "  {:>7.4}  {}", hotspot.score, hotspot.id).ok();
    }
    out
}

#[must_use]
pub fn render_refactor(plan: &RefactorPlan) -> String {
    if plan.suggestions.is_empty() {
        return "No refactoring candidates found.\n".to_string();
    }
    let mut out = String::new();
    for (i, s) in plan.suggestions.iter().enumerate() {
        let actions: Vec<&str> = s.actions.iter().map(|a| a.as_str()).collect();
        writeln!(out, "{}. {} (impact {:.4})", i + 1, s.id, s.impact_score).ok();
        writeln!(out, "   {}", s.file).ok();
        writeln!(out, "   {}", s.reason).ok();
        writeln!(out, "   actions: {}", actions.join(", ")).ok();
    }
    out
}

#[must_use]
pub fn render_providers(payload: &ProvidersPayload) -> String {
    let mut out = String::new();
    let preferred = payload.default_provider.as_deref().unwrap_or("none");
    writeln!(
        out,
        "Default provider: {preferred} ({})",
        payload.default_provider_source
    )
    .ok();
    writeln!(
        out,
        "Timeout: {}s ({})",
        payload.timeout_seconds, payload.timeout_source
    )
    .ok();
    writeln!(
        out,
        "Credentials: {}",
        if payload.vault { "vault, then environment" } else { "environment" }
    )
    .ok();
    out.push('\n');
    writeln!(
        out,
        "{:<14} {:<10} {:>8} {:>8} {:>10}",
        "Provider", "Breaker", "Failures", "Weight", "Tokens"
    )
    .ok();
    for p in &payload.providers {
        writeln!(
            out,
            "{:<14} {:<10} {:>8} {:>8.2} {:>10}",
            p.name,
            p.circuit_breaker_status.as_str(),
            p.failure_count,
            p.weight,
            p.token_usage.total
        )
        .ok();
    }
    out
}

#[must_use]
pub fn render_error(error: &CodieError) -> String {
    format!("Error [{}]: {error}", error.error_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analyzer::AnalysisType;
    use crate::core::refactor::plan_from_graph;

    #[test]
    fn analysis_lists_numbered_suggestions() {
        let payload = AnalysisPayload {
            source: "app.py".into(),
            language: "python".into(),
            analysis_type: AnalysisType::Security,
            show_all: false,
            complexity: 4,
            suggestions: vec!["Validate input before building SQL".into()],
        };
        let out = render_analysis(&payload);
        assert!(out.starts_with("app.py (python, security analysis, complexity 4)"));
        assert!(out.contains("  1. Validate input before building SQL"));
    }

    #[test]
    fn empty_graph_and_plan_messages() {
        let graph = CallGraph::default();
        assert_eq!(render_graph(&graph), "No functions found.\n");
        assert_eq!(
            render_refactor(&plan_from_graph(&graph, 10)),
            "No refactoring candidates found.\n"
        );
    }

    #[test]
    fn error_line_has_code() {
        assert_eq!(
            render_error(&CodieError::EmptyCode),
            "Error [CODIE-V001]: code cannot be empty"
        );
    }
}
