//! Error types for inference server communication.

use thiserror::Error;

/// Errors that can occur while talking to the inference server.
///
/// These stay inside the transport and configuration layers. The session
/// and the model directory turn them into silent no-ops or visible
/// response text instead of returning them.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("API error: {0}")]
    Api(String),

    /// Server is not running or not reachable.
    #[error("Server not running at {0}. Start it with: ollama serve")]
    ServerNotRunning(String),

    /// Configured base URL cannot be used.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Map a reqwest failure, treating connection refusals as a missing server.
    pub(crate) fn from_request(err: reqwest::Error, base_url: &str) -> Self {
        if err.is_connect() {
            ClientError::ServerNotRunning(base_url.to_string())
        } else if err.is_builder() {
            ClientError::InvalidUrl(base_url.to_string())
        } else {
            ClientError::Http(err)
        }
    }
}
