//! Google Gemini provider.
//!
//! Calls the `generateContent` JSON API with the key as a `key` query
//! parameter and reads `candidates[].content.parts[].text`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{Value, json};

use super::{MAX_SUGGESTIONS, clean_lines, suggestion_prompt};
use crate::core::http::{build_client, read_json, transport_error};
use crate::core::provider::{ProviderConfig, SuggestionBackend};
use crate::error::{CodieError, Result};

/// Provider name.
pub const NAME: &str = "gemini";

/// Estimated output tokens per suggestion.
pub const OUTPUT_TOKENS_PER_SUGGESTION: u64 = 20;

#[derive(Debug)]
pub struct GeminiBackend {
    config: ProviderConfig,
    client: Client,
}

impl GeminiBackend {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = build_client(config.timeout, config.connect_timeout)?;
        Ok(Self { config, client })
    }

    fn url(&self) -> Result<Url> {
        Url::parse_with_params(&self.config.endpoint, &[("key", self.config.api_key.as_str())])
            .map_err(|e| CodieError::ConfigInvalid {
                key: "ai.gemini.endpoint".to_string(),
                value: self.config.endpoint.clone(),
                message: e.to_string(),
            })
    }
}

/// Request body for `generateContent`.
#[must_use]
pub fn request_body(code: &str, language: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{
                "text": suggestion_prompt(
                    code,
                    language,
                    "(no prose, one sentence each, focus on quality and best practices).",
                ),
            }]
        }],
        "generationConfig": {
            "temperature": 0.3,
            "maxOutputTokens": 300,
            "topP": 0.8,
        }
    })
}

/// Extract suggestions from a `generateContent` response.
///
/// Missing or mistyped fields contribute nothing.
#[must_use]
pub fn parse_response(data: &Value) -> Vec<String> {
    let mut suggestions: Vec<String> = data
        .get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|candidate| candidate.pointer("/content/parts").and_then(Value::as_array))
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .flat_map(clean_lines)
        .collect();
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[async_trait]
impl SuggestionBackend for GeminiBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn request(&self, code: &str, language: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .post(self.url()?)
            .json(&request_body(code, language))
            .send()
            .await
            .map_err(|e| transport_error(NAME, self.config.timeout, e))?;

        let data = read_json(NAME, "Gemini", response).await?;
        let suggestions = parse_response(&data);
        tracing::debug!(provider = NAME, count = suggestions.len(), "Parsed suggestions");
        Ok(suggestions)
    }

    fn output_tokens_per_suggestion(&self) -> u64 {
        OUTPUT_TOKENS_PER_SUGGESTION
    }
}
