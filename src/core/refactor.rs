//! Ranked refactoring suggestions derived from the call graph.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::{CallGraph, GraphBuilder, round4};

/// Default number of suggestions in a plan.
pub const DEFAULT_TOP_N: usize = 10;

/// Complexity at which branching reductions are suggested.
const COMPLEXITY_ACTION_THRESHOLD: u32 = 10;

/// Degree at which dependency decoupling is suggested.
const DEGREE_ACTION_THRESHOLD: usize = 6;

const COMPLEXITY_WEIGHT: f64 = 0.6;
const DEGREE_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefactorAction {
    ExtractMethod,
    ReduceBranching,
    DecoupleDeps,
    AddTests,
}

impl RefactorAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtractMethod => "extract-method",
            Self::ReduceBranching => "reduce-branching",
            Self::DecoupleDeps => "decouple-deps",
            Self::AddTests => "add-tests",
        }
    }
}

impl std::fmt::Display for RefactorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefactorSuggestion {
    pub id: String,
    pub file: String,
    pub reason: String,
    pub impact_score: f64,
    pub actions: Vec<RefactorAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefactorPlan {
    pub generated_at: DateTime<Utc>,
    pub suggestions: Vec<RefactorSuggestion>,
}

/// Graph `root` with default settings and plan the top `top_n` functions.
#[must_use]
pub fn build_refactor_plan(root: &Path, top_n: usize) -> RefactorPlan {
    plan_from_graph(&GraphBuilder::default().build_graph(root), top_n)
}

/// Rank every node of `graph` by weighted complexity and degree.
#[must_use]
pub fn plan_from_graph(graph: &CallGraph, top_n: usize) -> RefactorPlan {
    let max_complexity = graph.nodes.iter().map(|n| n.complexity).max().unwrap_or(0).max(1);
    let max_degree = graph.nodes.iter().map(|n| n.degree).max().unwrap_or(0).max(1);

    let mut suggestions: Vec<RefactorSuggestion> = graph
        .nodes
        .iter()
        .map(|node| {
            #[allow(clippy::cast_precision_loss)]
            let degree_share = node.degree as f64 / max_degree as f64;
            let complexity_share = f64::from(node.complexity) / f64::from(max_complexity);

            RefactorSuggestion {
                id: node.id.clone(),
                file: node.file.clone(),
                reason: format!(
                    "High hotspot factors: complexity {}, degree {}",
                    node.complexity, node.degree
                ),
                impact_score: round4(COMPLEXITY_WEIGHT * complexity_share + DEGREE_WEIGHT * degree_share),
                actions: actions_for(node.complexity, node.degree),
            }
        })
        .collect();

    suggestions.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
    suggestions.truncate(top_n);

    tracing::debug!(suggestions = suggestions.len(), "Built refactor plan");
    RefactorPlan {
        generated_at: Utc::now(),
        suggestions,
    }
}

fn actions_for(complexity: u32, degree: usize) -> Vec<RefactorAction> {
    let mut actions = Vec::new();
    if complexity >= COMPLEXITY_ACTION_THRESHOLD {
        actions.extend([RefactorAction::ExtractMethod, RefactorAction::ReduceBranching]);
    }
    if degree >= DEGREE_ACTION_THRESHOLD {
        actions.push(RefactorAction::DecoupleDeps);
    }
    if actions.is_empty() {
        actions.push(RefactorAction::AddTests);
    }
    actions
}
