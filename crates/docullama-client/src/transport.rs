//! HTTP transport to the Ollama inference server.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt};
use tracing::debug;

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::ClientError;
use crate::types::{GenerationRequest, ModelDescriptor, ModelList};

/// Lazy, finite sequence of response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// Access to the two server endpoints the client needs.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Fetch the models the server has available.
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, ClientError>;

    /// Start a streaming generation and return its body as it arrives.
    async fn generate(&self, request: &GenerationRequest) -> Result<ByteStream, ClientError>;
}

/// Ollama API client bound to one base URL.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new client for the default local server.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_BASE_URL)
    }

    /// Create a new client with a custom URL.
    pub fn with_url(base_url: impl AsRef<str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: crate::config::normalize_base_url(base_url.as_ref()),
        }
    }

    /// Create a client for the server named in `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_url(&config.base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server answers on its model listing endpoint.
    pub async fn check_health(&self) -> Result<(), ClientError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::ServerNotRunning(self.base_url.clone())
                } else {
                    ClientError::from_request(e, &self.base_url)
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::ServerNotRunning(self.base_url.clone()))
        }
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(ClientError::Api(format!("{}: {}", status, text)))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for OllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, ClientError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_request(e, &self.base_url))?;
        let response = Self::ensure_success(response).await?;

        let body = response.bytes().await?;
        let list: ModelList = serde_json::from_slice(&body)?;
        debug!(count = list.models.len(), "listed models");

        Ok(list.models)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ByteStream, ClientError> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(model = %request.model, prompt_len = request.prompt.len(), "starting generation");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::from_request(e, &self.base_url))?;

        // Error statuses still stream their body; an `{"error": ...}` line
        // is not a generation chunk and gets dropped by the decoder.
        let status = response.status();
        if !status.is_success() {
            debug!(%status, model = %request.model, "generation answered with error status");
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::Http));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client() {
        let client = OllamaClient::new();
        assert_eq!(client.base_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn test_custom_url() {
        let client = OllamaClient::with_url("http://192.168.1.100:11434/");
        assert_eq!(client.base_url(), "http://192.168.1.100:11434");
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig::builder().base_url("gpu-box:11434").build();
        let client = OllamaClient::from_config(&config);
        assert_eq!(client.base_url(), "http://gpu-box:11434");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let client = OllamaClient::with_url("http://127.0.0.1:9");
        let result = client.list_models().await;
        assert!(result.is_err());
    }
}
