//! Command payloads and the robot-mode output envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analyzer::AnalysisType;
use super::parser::SnippetSummary;
use super::provider::ProviderStatus;
use super::token_usage::TokenCounts;
use crate::storage::ConfigSource;

/// Schema identifier carried by every JSON document.
pub const SCHEMA_VERSION: &str = "codie.v1";

// =============================================================================
// Payloads
// =============================================================================

/// Result of `codie analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    /// Input path, or `-` for stdin.
    pub source: String,
    pub language: String,
    pub analysis_type: AnalysisType,
    pub show_all: bool,
    pub complexity: u32,
    pub suggestions: Vec<String>,
}

/// Result of `codie complexity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityPayload {
    pub source: String,
    pub language: String,
    pub complexity: u32,
    pub structure: SnippetSummary,
}

/// Result of `codie providers`.
#[derive(Debug, Clone, Serialize)]
pub struct ProvidersPayload {
    pub default_provider: Option<String>,
    pub default_provider_source: ConfigSource,
    pub timeout_seconds: u64,
    pub timeout_source: ConfigSource,
    /// Whether credentials come from Vault before the environment.
    pub vault: bool,
    pub providers: Vec<ProviderStatus>,
    pub token_usage: BTreeMap<String, TokenCounts>,
}

// =============================================================================
// Robot Output Envelope
// =============================================================================

/// Versioned wrapper for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,
    pub meta: RobotMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotMeta {
    pub format: String,
    pub version: String,
}

impl<T> RobotOutput<T> {
    pub fn new(command: impl Into<String>, data: T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            command: command.into(),
            data,
            meta: RobotMeta {
                format: "json".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Machine-readable error body for JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}
