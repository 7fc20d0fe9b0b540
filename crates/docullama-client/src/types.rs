//! Wire types for the inference server API.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::prompt::apply_template;

/// A model advertised by `GET /api/tags`.
///
/// Identity is the `name` alone: two descriptors with the same name but a
/// different underlying tag compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique model name, e.g. `llama3.2:latest`
    pub name: String,
    /// Underlying model tag
    pub model: String,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }

    /// Descriptor for a model known only by name (e.g. from configuration).
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            model: name.clone(),
            name,
        }
    }
}

impl PartialEq for ModelDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ModelDescriptor {}

impl Hash for ModelDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Response body of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelList {
    pub models: Vec<ModelDescriptor>,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

impl GenerationRequest {
    /// Build a streaming request; `template` is a literal prefix of `input`.
    pub fn new(model: impl Into<String>, template: &str, input: &str) -> Self {
        Self {
            model: model.into(),
            prompt: apply_template(template, input),
            stream: true,
        }
    }
}

/// One decoded line of a streaming generation response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationChunk {
    pub model: String,
    pub response: String,
    /// Set on the server's final line; the stream itself ends at connection close.
    #[serde(default)]
    pub done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptor_identity_is_name() {
        let a = ModelDescriptor::new("llama3.2:latest", "llama3.2:latest");
        let b = ModelDescriptor::new("llama3.2:latest", "something-else");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_decode_model_list() {
        let body = r#"{"models":[{"name":"mistral:7b","model":"mistral:7b","size":4109865159},{"name":"qwen2.5-coder:7b","model":"qwen2.5-coder:7b"}]}"#;
        let list: ModelList = serde_json::from_str(body).unwrap();
        let names: Vec<_> = list.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["mistral:7b", "qwen2.5-coder:7b"]);
    }

    #[test]
    fn test_request_body() {
        let request = GenerationRequest::new("mistral:7b", "Document: ", "fn f() {}");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "mistral:7b",
                "prompt": "Document: fn f() {}",
                "stream": true,
            })
        );
    }

    #[test]
    fn test_decode_chunk_ignores_extra_fields() {
        let line = r#"{"model":"m","created_at":"2024-01-01T00:00:00Z","response":"Hi","done":false}"#;
        let chunk: GenerationChunk = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.response, "Hi");
        assert!(!chunk.done);
    }

    #[test]
    fn test_decode_chunk_requires_response() {
        let line = r#"{"model":"m","error":"model not found"}"#;
        assert!(serde_json::from_str::<GenerationChunk>(line).is_err());
    }
}
