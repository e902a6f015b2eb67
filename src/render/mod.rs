//! Output rendering for human and robot modes.

pub mod human;
pub mod robot;

use crate::cli::args::OutputFormat;
use crate::core::graph::CallGraph;
use crate::core::models::{AnalysisPayload, ComplexityPayload, ProvidersPayload};
use crate::core::refactor::RefactorPlan;
use crate::error::{CodieError, Result};

pub fn render_analysis(payload: &AnalysisPayload, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_analysis(payload)),
        OutputFormat::Json => robot::render_envelope("analyze", payload, pretty),
    }
}

pub fn render_complexity(
    payload: &ComplexityPayload,
    format: OutputFormat,
    pretty: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_complexity(payload)),
        OutputFormat::Json => robot::render_envelope("complexity", payload, pretty),
    }
}

pub fn render_graph(graph: &CallGraph, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_graph(graph)),
        OutputFormat::Json => robot::render_envelope("graph", graph, pretty),
    }
}

pub fn render_refactor(plan: &RefactorPlan, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_refactor(plan)),
        OutputFormat::Json => robot::render_envelope("refactor", plan, pretty),
    }
}

pub fn render_providers(payload: &ProvidersPayload, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_providers(payload)),
        OutputFormat::Json => robot::render_envelope("providers", payload, pretty),
    }
}

/// Render an error for stderr. JSON mode emits an envelope with an `error` body.
#[must_use]
pub fn render_error(error: &CodieError, command: &str, format: OutputFormat, pretty: bool) -> String {
    match format {
        OutputFormat::Json => robot::render_error_json(error, command, pretty),
        OutputFormat::Human => human::render_error(error),
    }
}
