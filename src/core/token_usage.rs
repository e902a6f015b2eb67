//! Estimated token accounting per provider.
//!
//! One tracker is owned by the provider manager and shared (via `Arc`) with
//! every provider handle, so per-provider recording and the manager-level
//! summary read the same counters.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Counters for one provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

/// Rough token estimate: one token per four characters.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() / 4) as u64
}

#[derive(Debug, Default)]
pub struct TokenUsageTracker {
    usage: Mutex<BTreeMap<String, TokenCounts>>,
}

impl TokenUsageTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a provider's counters.
    pub fn record(&self, provider: &str, input: u64, output: u64) {
        let mut usage = self.usage.lock().unwrap_or_else(PoisonError::into_inner);
        let counts = usage.entry(provider.to_string()).or_default();
        counts.input = counts.input.saturating_add(input);
        counts.output = counts.output.saturating_add(output);
        counts.total = counts.total.saturating_add(input.saturating_add(output));
        tracing::debug!(
            provider,
            input_tokens = input,
            output_tokens = output,
            "Token usage recorded"
        );
    }

    /// Copy of all counters, keyed by provider name.
    #[must_use]
    pub fn summary(&self) -> BTreeMap<String, TokenCounts> {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counters for one provider; zero if it never recorded usage.
    #[must_use]
    pub fn usage_for(&self, provider: &str) -> TokenCounts {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .copied()
            .unwrap_or_default()
    }
}
