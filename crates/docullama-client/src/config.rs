//! Client configuration.

use std::path::Path;

use crate::error::ClientError;
use crate::prompt::DEFAULT_TEMPLATE;

/// Default inference server URL.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Configuration for talking to the inference server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server base URL, without a trailing slash
    pub base_url: String,
    /// Preferred model; the first listed model is used when unset
    pub model: Option<String>,
    /// Instruction template prepended to every prompt
    pub template: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: None,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    ///
    /// Reads `DOCULLAMA_URL` (falling back to `OLLAMA_HOST`), `DOCULLAMA_MODEL`,
    /// `DOCULLAMA_TEMPLATE_FILE` and `DOCULLAMA_TEMPLATE`. Fails only when a
    /// template file is named but cannot be read.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("DOCULLAMA_URL")
            .or_else(|_| std::env::var("OLLAMA_HOST"))
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = std::env::var("DOCULLAMA_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty());

        let template = match std::env::var("DOCULLAMA_TEMPLATE_FILE") {
            Ok(path) => read_template(path)?,
            Err(_) => std::env::var("DOCULLAMA_TEMPLATE")
                .unwrap_or_else(|_| DEFAULT_TEMPLATE.to_string()),
        };

        Ok(Self {
            base_url,
            model,
            template,
        })
    }

    /// Create a builder for configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self {
        self.config.base_url = normalize_base_url(url.as_ref());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.config.template = template.into();
        self
    }

    pub fn template_file(mut self, path: impl AsRef<Path>) -> Result<Self, ClientError> {
        self.config.template = read_template(path)?;
        Ok(self)
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Trim trailing slashes and add a scheme to bare `host:port` values.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Read an instruction template from disk, verbatim.
pub fn read_template(path: impl AsRef<Path>) -> Result<String, ClientError> {
    Ok(std::fs::read_to_string(path)?)
}
