use reqwest::StatusCode;
use serde_json::Value;

/// Failures talking to the platform.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform answered with a non-success status. `message` is the
    /// platform-supplied `error.message` or the HTTP status line.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The response body was not the JSON shape we expected.
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Builds a [`ApiError::Status`] from a failed response body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::Status {
            status: status.as_u16(),
            message: status_message(status, body),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extracts `error.message` from an error body, falling back to the HTTP
/// status line (`HTTP 404: Not Found`).
pub fn status_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("")))
}
