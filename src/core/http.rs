//! HTTP client utilities.
//!
//! Provides the client builder and response helpers shared by provider
//! backends and the secret resolver.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response};

use crate::error::{CodieError, Result};

/// Default total timeout for provider requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout applied to every client.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for secret store lookups.
pub const SECRET_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a configured HTTP client with a total and a connect timeout.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration, connect_timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(connect_timeout.min(timeout))
        .user_agent(format!("codie/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CodieError::Network(e.to_string()))
}

/// Map a transport error from `send()` for `provider`.
///
/// The request URL is dropped from the message since it may carry a key.
#[must_use]
pub fn transport_error(provider: &str, timeout: Duration, err: reqwest::Error) -> CodieError {
    let err = err.without_url();
    if err.is_timeout() {
        CodieError::Timeout {
            provider: provider.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        CodieError::Network(err.to_string())
    }
}

/// Read a 2xx response body as JSON.
///
/// Non-success statuses become `ProviderUnavailable` carrying
/// `"{label} API error: {status}"`; an unreadable body is a parse error.
///
/// # Errors
///
/// Returns error on non-2xx status or invalid JSON.
pub async fn read_json(
    provider: &str,
    label: &str,
    response: Response,
) -> Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(CodieError::unavailable(
            provider,
            format!("{label} API error: {}", status.as_u16()),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| CodieError::ParseResponse(e.without_url().to_string()))
}
