//! AI provider manager.
//!
//! Holds the ordered list of provider handles and tries them in turn. The
//! first non-empty answer wins; failures are logged and skipped. The manager
//! owns the single token tracker every handle records into.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::circuit_breaker::BreakerSettings;
use super::provider::{ProviderConfig, ProviderHandle, ProviderKind, ProviderStatus, SuggestionBackend};
use super::token_usage::{TokenCounts, TokenUsageTracker};
use crate::error::{CodieError, Result};
use crate::providers::{GeminiBackend, HuggingFaceBackend, MockBackend};
use crate::storage::{ResolvedConfig, SecretResolver};

#[derive(Debug)]
pub struct ProviderManager {
    providers: Vec<ProviderHandle>,
    tokens: Arc<TokenUsageTracker>,
}

/// Preference order with `preferred` moved to the front.
#[must_use]
pub fn preference_order(preferred: Option<ProviderKind>) -> Vec<ProviderKind> {
    let mut order = ProviderKind::ALL.to_vec();
    if let Some(first) = preferred
        && let Some(pos) = order.iter().position(|k| *k == first)
    {
        let kind = order.remove(pos);
        order.insert(0, kind);
    }
    order
}

impl ProviderManager {
    /// Build providers from configuration, resolving credentials once.
    ///
    /// Remote providers without a credential or disabled in config are not
    /// registered. The mock is registered only when no remote provider is.
    ///
    /// # Errors
    ///
    /// Returns error if a provider's HTTP client cannot be built.
    pub async fn from_config(config: &ResolvedConfig, secrets: &SecretResolver) -> Result<Self> {
        let tokens = Arc::new(TokenUsageTracker::new());
        let breaker = config.breaker_settings();
        let mut providers = Vec::new();

        for kind in preference_order(config.default_provider) {
            let Some(settings) = config.config.ai.provider(kind) else {
                continue;
            };
            if !settings.enabled {
                tracing::info!(provider = %kind, "Provider disabled in config");
                continue;
            }
            let Some(key_name) = kind.credential_key() else {
                continue;
            };
            let Some(api_key) = secrets.get(key_name).await else {
                tracing::debug!(provider = %kind, key = key_name, "No credential, provider skipped");
                continue;
            };

            let mut provider_config =
                ProviderConfig::new(kind, api_key).with_timeout(config.provider_timeout(kind));
            if let Some(endpoint) = &settings.endpoint {
                provider_config = provider_config.with_endpoint(endpoint.clone());
            }
            if let Some(weight) = settings.weight {
                provider_config = provider_config.with_weight(weight);
            }
            let weight = provider_config.weight;

            let backend: Box<dyn SuggestionBackend> = match kind {
                ProviderKind::Gemini => Box::new(GeminiBackend::new(provider_config)?),
                ProviderKind::HuggingFace => Box::new(HuggingFaceBackend::new(provider_config)?),
                ProviderKind::Mock => continue,
            };
            tracing::info!(provider = %kind, "Provider initialized");
            providers.push(ProviderHandle::new(backend, breaker, Arc::clone(&tokens), weight));
        }

        Ok(Self::assemble(providers, tokens, breaker))
    }

    /// Manager over explicit backends, in the given order.
    ///
    /// The mock is appended when `backends` is empty.
    #[must_use]
    pub fn with_backends(backends: Vec<Box<dyn SuggestionBackend>>, breaker: BreakerSettings) -> Self {
        let tokens = Arc::new(TokenUsageTracker::new());
        let providers = backends
            .into_iter()
            .map(|backend| ProviderHandle::new(backend, breaker, Arc::clone(&tokens), 1.0))
            .collect();
        Self::assemble(providers, tokens, breaker)
    }

    fn assemble(
        mut providers: Vec<ProviderHandle>,
        tokens: Arc<TokenUsageTracker>,
        breaker: BreakerSettings,
    ) -> Self {
        if providers.is_empty() {
            tracing::warn!("No AI providers configured, using mock provider");
            providers.push(ProviderHandle::new(
                Box::new(MockBackend),
                breaker,
                Arc::clone(&tokens),
                ProviderKind::Mock.default_weight(),
            ));
        }
        Self { providers, tokens }
    }

    /// Registered provider names in preference order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(ProviderHandle::name).collect()
    }

    /// Suggestions from the first provider that returns any.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCode` for empty or whitespace-only code. Provider
    /// failures never surface; if every provider fails the list is empty.
    pub async fn get_suggestions(&self, code: &str, language: &str) -> Result<Vec<String>> {
        if code.trim().is_empty() {
            return Err(CodieError::EmptyCode);
        }

        for provider in &self.providers {
            match provider.generate_suggestions(code, language).await {
                Ok(suggestions) if !suggestions.is_empty() => {
                    tracing::info!(
                        provider = provider.name(),
                        count = suggestions.len(),
                        "Provider succeeded"
                    );
                    return Ok(suggestions);
                }
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), "Provider returned no suggestions");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Provider failed");
                }
            }
        }

        tracing::error!("All AI providers failed");
        Ok(Vec::new())
    }

    /// Status of every registered provider, in preference order.
    #[must_use]
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.providers.iter().map(ProviderHandle::status).collect()
    }

    /// Token usage for all providers.
    #[must_use]
    pub fn token_usage(&self) -> BTreeMap<String, TokenCounts> {
        self.tokens.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock;

    #[test]
    fn default_order() {
        assert_eq!(
            preference_order(None),
            vec![ProviderKind::Gemini, ProviderKind::HuggingFace, ProviderKind::Mock]
        );
    }

    #[test]
    fn preferred_provider_moves_first() {
        assert_eq!(
            preference_order(Some(ProviderKind::HuggingFace)),
            vec![ProviderKind::HuggingFace, ProviderKind::Gemini, ProviderKind::Mock]
        );
    }

    #[tokio::test]
    async fn empty_manager_falls_back_to_mock() {
        let manager = ProviderManager::with_backends(Vec::new(), BreakerSettings::default());
        assert_eq!(manager.provider_names(), vec!["mock"]);
        let out = manager.get_suggestions("x = 1", "python").await.unwrap();
        assert_eq!(out, mock::SUGGESTIONS);
        assert!(manager.token_usage().is_empty());
    }

    #[tokio::test]
    async fn whitespace_code_is_rejected() {
        let manager = ProviderManager::with_backends(Vec::new(), BreakerSettings::default());
        let err = manager.get_suggestions("  \n\t", "python").await.unwrap_err();
        assert!(matches!(err, CodieError::EmptyCode));
    }

    #[test]
    fn mock_status_is_closed() {
        let manager = ProviderManager::with_backends(Vec::new(), BreakerSettings::default());
        let status = manager.provider_status();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].name, "mock");
        assert_eq!(status[0].failure_count, 0);
    }
}
