//! # DocuLlama client
//!
//! Client side of a single-prompt front-end for a locally hosted Ollama
//! server: list the available models, send one prompt wrapped in an
//! instruction template, and follow the streamed answer as it arrives.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ ModelDirectory  │     │GenerationSession│ <-- │  StreamDecoder  │
//! │  GET /api/tags  │     │POST /api/generate     │  (NDJSON lines) │
//! └────────┬────────┘     └────────┬────────┘     └─────────────────┘
//!          │                       │
//!          └──────────┬────────────┘
//!               ┌─────┴─────┐
//!               │ Transport │  (OllamaClient over reqwest)
//!               └───────────┘
//! ```
//!
//! Failures never escape the session or the directory: a failed model
//! refresh keeps the previous list, undecodable stream lines are dropped,
//! and transport errors during generation are appended to the response.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use docullama_client::{ClientConfig, GenerationSession, ModelDirectory, OllamaClient};
//!
//! let config = ClientConfig::from_env()?;
//! let transport = Arc::new(OllamaClient::from_config(&config));
//!
//! let mut models = ModelDirectory::new(transport.clone());
//! models.fetch_models().await;
//!
//! let mut session = GenerationSession::new(transport);
//! session.subscribe(|event| println!("{:?}", event));
//! session.send("func add(a: Int) {}", models.selected(), &config.template);
//! session.run_to_completion().await;
//! ```

mod config;
mod decoder;
mod error;
mod models;
mod prompt;
mod session;
mod transport;
mod types;

pub use config::{
    normalize_base_url, read_template, ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL,
};
pub use decoder::{Decoded, StreamDecoder};
pub use error::ClientError;
pub use models::{DirectoryEvent, ModelDirectory};
pub use prompt::{apply_template, DEFAULT_TEMPLATE};
pub use session::{GenerationSession, RequestId, SessionEvent, SessionState};
pub use transport::{ByteStream, OllamaClient, Transport};
pub use types::{GenerationChunk, GenerationRequest, ModelDescriptor};
