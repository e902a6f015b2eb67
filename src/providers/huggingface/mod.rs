//! Hugging Face inference API provider.
//!
//! Bearer-token auth; reads `generated_text` from an object or from the first
//! element of an array.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::{MAX_SUGGESTIONS, clean_lines, suggestion_prompt};
use crate::core::http::{build_client, read_json, transport_error};
use crate::core::provider::{ProviderConfig, SuggestionBackend};
use crate::error::Result;

/// Provider name.
pub const NAME: &str = "huggingface";

/// Estimated output tokens per suggestion.
pub const OUTPUT_TOKENS_PER_SUGGESTION: u64 = 15;

#[derive(Debug)]
pub struct HuggingFaceBackend {
    config: ProviderConfig,
    client: Client,
}

impl HuggingFaceBackend {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = build_client(config.timeout, config.connect_timeout)?;
        Ok(Self { config, client })
    }
}

/// Request body for the text-generation task.
#[must_use]
pub fn request_body(code: &str, language: &str) -> Value {
    json!({
        "inputs": suggestion_prompt(code, language, "(no prose, one sentence each). Use bullets."),
        "parameters": {
            "max_new_tokens": 200,
            "temperature": 0.3,
            "top_p": 0.8,
            "do_sample": true,
        }
    })
}

/// Extract suggestions from an inference response.
#[must_use]
pub fn parse_response(data: &Value) -> Vec<String> {
    let record = match data {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(data),
        _ => None,
    };
    let text = record
        .and_then(|r| r.get("generated_text"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut suggestions = clean_lines(text);
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[async_trait]
impl SuggestionBackend for HuggingFaceBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn request(&self, code: &str, language: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request_body(code, language))
            .send()
            .await
            .map_err(|e| transport_error(NAME, self.config.timeout, e))?;

        let data = read_json(NAME, "Hugging Face", response).await?;
        let suggestions = parse_response(&data);
        tracing::debug!(provider = NAME, count = suggestions.len(), "Parsed suggestions");
        Ok(suggestions)
    }

    fn output_tokens_per_suggestion(&self) -> u64 {
        OUTPUT_TOKENS_PER_SUGGESTION
    }
}
