//! Error types for codie.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into five main categories:
//! - **Validation**: Bad or missing caller input (empty code, unknown language)
//! - **Provider**: AI provider unavailable, API errors, unparsable payloads
//! - **Network**: Timeouts and transport failures talking to a provider
//! - **Configuration**: Config file parsing or invalid values
//! - **Internal**: I/O, JSON, and unclassified errors
//!
//! Parse failures in the complexity analyzer and unreadable files during a
//! graph build never surface as errors: the former degrade to a cheaper
//! heuristic and the latter are skipped.
//!
//! Each error has a stable error code (e.g., `CODIE-V001`) for programmatic handling.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid caller input. Surfaced, never retried.
    Validation,
    /// Provider-side failures (unavailable, API error, bad payload).
    Provider,
    /// Transport failures (timeout, connection).
    Network,
    /// Configuration issues (parse errors, invalid values).
    Configuration,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Validation error",
            Self::Provider => "Provider error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Validation => "V",
            Self::Provider => "P",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Invalid input or configuration
    InvalidInput = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for codie operations.
#[derive(Error, Debug)]
pub enum CodieError {
    // ==========================================================================
    // Validation errors (Category: Validation)
    // ==========================================================================
    /// Code to analyze was empty or whitespace only.
    #[error("code cannot be empty")]
    EmptyCode,

    /// Language is not in the supported set.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Any other invalid argument.
    #[error("invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    // ==========================================================================
    // Provider errors (Category: Provider)
    // ==========================================================================
    /// Provider is unavailable: breaker open or upstream failure.
    #[error("provider {provider} unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// Failed to parse a provider response body.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Request timed out.
    #[error("request timeout after {seconds}s for {provider}")]
    Timeout { provider: String, seconds: u64 },

    /// Generic transport error.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CodieError {
    /// Shorthand for [`CodieError::ProviderUnavailable`].
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map error to a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::EmptyCode
            | Self::UnsupportedLanguage(_)
            | Self::InvalidArgument { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. } => ExitCode::InvalidInput,

            Self::Timeout { .. } => ExitCode::Timeout,

            Self::ProviderUnavailable { .. }
            | Self::ParseResponse(_)
            | Self::Network(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyCode | Self::UnsupportedLanguage(_) | Self::InvalidArgument { .. } => {
                ErrorCategory::Validation
            }

            Self::ProviderUnavailable { .. } | Self::ParseResponse(_) => ErrorCategory::Provider,

            Self::Timeout { .. } | Self::Network(_) => ErrorCategory::Network,

            Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => ErrorCategory::Configuration,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `CODIE-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyCode => "CODIE-V001",
            Self::UnsupportedLanguage(_) => "CODIE-V002",
            Self::InvalidArgument { .. } => "CODIE-V003",

            Self::ProviderUnavailable { .. } => "CODIE-P001",
            Self::ParseResponse(_) => "CODIE-P010",

            Self::Timeout { .. } => "CODIE-N001",
            Self::Network(_) => "CODIE-N099",

            Self::ConfigParse { .. } => "CODIE-C001",
            Self::ConfigInvalid { .. } => "CODIE-C002",

            Self::Io(_) => "CODIE-X001",
            Self::Json(_) => "CODIE-X002",
            Self::Other(_) => "CODIE-X099",
        }
    }

    /// Whether this error counts toward a circuit breaker's failure threshold.
    ///
    /// Only "provider unavailable"-class failures trip a breaker. Caller-side
    /// validation errors never do.
    #[must_use]
    pub const fn is_breaker_tracked(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::Timeout { .. } | Self::Network(_)
        )
    }

    /// Whether the error was caused by the caller's input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.category(), ErrorCategory::Validation)
    }

    /// Returns the provider name if this error is provider-specific.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::ProviderUnavailable { provider, .. } | Self::Timeout { provider, .. } => {
                Some(provider)
            }
            _ => None,
        }
    }
}

/// Result type alias for codie operations.
pub type Result<T> = std::result::Result<T, CodieError>;
