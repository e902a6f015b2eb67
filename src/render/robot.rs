//! Robot-mode JSON output.
//!
//! JSON documents are wrapped in the versioned `codie.v1` envelope.

use serde::Serialize;

use crate::core::models::{ErrorPayload, RobotOutput};
use crate::error::{CodieError, Result};

pub fn render_json<T: Serialize>(output: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    Ok(json)
}

/// Wrap `data` in the envelope for `command` and serialize it.
pub fn render_envelope<T: Serialize>(command: &str, data: &T, pretty: bool) -> Result<String> {
    render_json(&RobotOutput::new(command, data), pretty)
}

/// Error envelope; never fails.
#[must_use]
pub fn render_error_json(error: &CodieError, command: &str, pretty: bool) -> String {
    let payload = ErrorPayload {
        code: error.error_code().to_string(),
        category: error.category().to_string(),
        message: error.to_string(),
        provider: error.provider().map(str::to_string),
    };
    let envelope = RobotOutput::new(command, serde_json::json!({ "error": payload }));
    render_json(&envelope, pretty).unwrap_or_else(|_| {
        format!(r#"{{"error":{{"code":"{}"}}}}"#, error.error_code())
    })
}
