//! AI provider descriptors and the breaker-guarded provider handle.
//!
//! A [`SuggestionBackend`] knows how to talk to one upstream API. A
//! [`ProviderHandle`] wraps a backend with its circuit breaker and the shared
//! token tracker, and is the only way the manager calls a backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::circuit_breaker::{
    self, BreakerPermit, BreakerSettings, BreakerState, BreakerSnapshot, CircuitBreaker,
};
use super::http::{CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
use super::token_usage::{TokenCounts, TokenUsageTracker, estimate_tokens};
use crate::error::{CodieError, Result};

// =============================================================================
// Provider Kind
// =============================================================================

/// Built-in provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    HuggingFace,
    Mock,
}

impl ProviderKind {
    /// Default preference order.
    pub const ALL: &'static [Self] = &[Self::Gemini, Self::HuggingFace, Self::Mock];

    /// Providers that call a remote API.
    pub const REMOTE: &'static [Self] = &[Self::Gemini, Self::HuggingFace];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::HuggingFace => "huggingface",
            Self::Mock => "mock",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::HuggingFace => "Hugging Face",
            Self::Mock => "Mock",
        }
    }

    /// Parse a provider name (case-insensitive; `hf` is accepted).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "huggingface" | "hugging_face" | "hf" => Ok(Self::HuggingFace),
            "mock" => Ok(Self::Mock),
            _ => Err(CodieError::InvalidArgument {
                name: "provider".to_string(),
                message: format!("unknown provider '{name}'"),
            }),
        }
    }

    /// Secret holding this provider's credential.
    #[must_use]
    pub const fn credential_key(self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::HuggingFace => Some("HUGGINGFACE_API_KEY"),
            Self::Mock => None,
        }
    }

    #[must_use]
    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
            }
            Self::HuggingFace => {
                "https://api-inference.huggingface.co/models/bigcode/starcoder2-3b"
            }
            Self::Mock => "",
        }
    }

    /// Relative weight reported in status output.
    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::Gemini => 0.7,
            Self::HuggingFace => 0.3,
            Self::Mock => 0.0,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Provider Config
// =============================================================================

/// Immutable settings for one provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Informational; providers never retry internally.
    pub max_retries: u32,
    pub weight: f64,
    pub enabled: bool,
}

impl ProviderConfig {
    /// Defaults for `kind` with the given credential.
    #[must_use]
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            endpoint: kind.default_endpoint().to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
            max_retries: 3,
            weight: kind.default_weight(),
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_retries", &self.max_retries)
            .field("weight", &self.weight)
            .field("enabled", &self.enabled)
            .finish()
    }
}

// =============================================================================
// Backend capability
// =============================================================================

/// One upstream suggestion API.
#[async_trait]
pub trait SuggestionBackend: Send + Sync {
    /// Provider name used for logging, status, and token accounting.
    fn name(&self) -> &str;

    /// Ask the upstream for suggestions. Parsed, cleaned, at most 5.
    async fn request(&self, code: &str, language: &str) -> Result<Vec<String>>;

    /// Estimated output tokens per returned suggestion.
    fn output_tokens_per_suggestion(&self) -> u64 {
        0
    }

    /// Local backends skip the circuit breaker and token accounting.
    fn is_local(&self) -> bool {
        false
    }
}

// =============================================================================
// Provider Handle
// =============================================================================

/// Status of one registered provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub enabled: bool,
    pub circuit_breaker_status: BreakerState,
    pub failure_count: u32,
    pub last_failure: Option<DateTime<Utc>>,
    pub token_usage: TokenCounts,
    pub weight: f64,
}

/// A backend guarded by its own circuit breaker.
pub struct ProviderHandle {
    backend: Box<dyn SuggestionBackend>,
    breaker: Option<Mutex<CircuitBreaker>>,
    tokens: Arc<TokenUsageTracker>,
    weight: f64,
}

impl ProviderHandle {
    #[must_use]
    pub fn new(
        backend: Box<dyn SuggestionBackend>,
        breaker: BreakerSettings,
        tokens: Arc<TokenUsageTracker>,
        weight: f64,
    ) -> Self {
        let breaker =
            (!backend.is_local()).then(|| Mutex::new(CircuitBreaker::new(backend.name(), breaker)));
        Self {
            backend,
            breaker,
            tokens,
            weight,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Generate suggestions through the breaker.
    ///
    /// # Errors
    ///
    /// `ProviderUnavailable` when the breaker refuses the call or the backend
    /// fails; the upstream detail is kept in the message.
    pub async fn generate_suggestions(&self, code: &str, language: &str) -> Result<Vec<String>> {
        let name = self.backend.name();
        let permit = match &self.breaker {
            Some(breaker) => Some(BreakerPermit::acquire(breaker).ok_or_else(|| {
                tracing::debug!(provider = name, "Circuit breaker refused call");
                CodieError::unavailable(name, "circuit breaker is open")
            })?),
            None => None,
        };

        match self.backend.request(code, language).await {
            Ok(suggestions) => {
                if let Some(permit) = permit {
                    permit.success();
                    let output = suggestions.len() as u64 * self.backend.output_tokens_per_suggestion();
                    self.tokens.record(name, estimate_tokens(code), output);
                }
                Ok(suggestions)
            }
            Err(err) => {
                if let Some(permit) = permit {
                    permit.failure(&err);
                }
                tracing::warn!(provider = name, error = %err, "Provider call failed");
                Err(match err {
                    CodieError::ProviderUnavailable { .. } => err,
                    other => CodieError::unavailable(name, other.to_string()),
                })
            }
        }
    }

    /// Breaker state for status output; local providers report closed.
    #[must_use]
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.as_ref().map_or(
            BreakerSnapshot {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure: None,
            },
            |b| circuit_breaker::lock(b).snapshot(),
        )
    }

    #[must_use]
    pub fn status(&self) -> ProviderStatus {
        let snapshot = self.breaker_snapshot();
        ProviderStatus {
            name: self.name().to_string(),
            enabled: true,
            circuit_breaker_status: snapshot.state,
            failure_count: snapshot.failure_count,
            last_failure: snapshot.last_failure,
            token_usage: self.tokens.usage_for(self.name()),
            weight: self.weight,
        }
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("name", &self.name())
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl SuggestionBackend for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn request(&self, _code: &str, _language: &str) -> Result<Vec<String>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(CodieError::Network("connection reset".into()))
            } else {
                Ok(vec!["Use a context manager for file handles".into()])
            }
        }

        fn output_tokens_per_suggestion(&self) -> u64 {
            20
        }
    }

    fn handle(fail_first: usize, threshold: u32) -> ProviderHandle {
        ProviderHandle::new(
            Box::new(Flaky {
                calls: AtomicUsize::new(0),
                fail_first,
            }),
            BreakerSettings {
                failure_threshold: threshold,
                recovery_timeout: Duration::from_secs(60),
            },
            Arc::new(TokenUsageTracker::new()),
            0.5,
        )
    }

    #[tokio::test]
    async fn success_records_tokens() {
        let h = handle(0, 5);
        let out = h.generate_suggestions("abcdefgh", "python").await.unwrap();
        assert_eq!(out.len(), 1);
        let status = h.status();
        assert_eq!(status.token_usage.input, 2);
        assert_eq!(status.token_usage.output, 20);
        assert_eq!(status.circuit_breaker_status, BreakerState::Closed);
    }

    #[tokio::test]
    async fn failures_are_wrapped_and_counted() {
        let h = handle(10, 5);
        let err = h.generate_suggestions("x", "python").await.unwrap_err();
        assert!(matches!(err, CodieError::ProviderUnavailable { ref provider, .. } if provider == "flaky"));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(h.status().failure_count, 1);
        assert_eq!(h.status().token_usage, TokenCounts::default());
    }

    #[tokio::test]
    async fn open_breaker_short_circuits() {
        let h = handle(10, 1);
        let _ = h.generate_suggestions("x", "python").await;
        assert_eq!(h.status().circuit_breaker_status, BreakerState::Open);

        let err = h.generate_suggestions("x", "python").await.unwrap_err();
        assert!(err.to_string().contains("circuit breaker is open"));
        assert_eq!(h.status().failure_count, 1);
    }

    #[test]
    fn debug_redacts_credential() {
        let cfg = ProviderConfig::new(ProviderKind::Gemini, "super-secret");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn kind_names_round_trip() {
        for &kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_name(kind.name()).unwrap(), kind);
        }
        assert_eq!(
            ProviderKind::from_name("HF").unwrap(),
            ProviderKind::HuggingFace
        );
        assert!(ProviderKind::from_name("openai").is_err());
    }
}
