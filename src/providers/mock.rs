//! Local development provider.
//!
//! Registered only when no remote provider is configured. Always answers with
//! the same three general suggestions; never gated or metered.

use async_trait::async_trait;

use crate::core::provider::SuggestionBackend;
use crate::error::Result;

/// Provider name.
pub const NAME: &str = "mock";

/// Fixed answer.
pub const SUGGESTIONS: [&str; 3] = [
    "Consider adding type hints for better code clarity",
    "Add docstrings to document function behavior",
    "Consider breaking down complex functions into smaller ones",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct MockBackend;

#[async_trait]
impl SuggestionBackend for MockBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn request(&self, _code: &str, _language: &str) -> Result<Vec<String>> {
        Ok(SUGGESTIONS.iter().map(ToString::to_string).collect())
    }

    fn is_local(&self) -> bool {
        true
    }
}
