//! Model directory: the server's model list and the current selection.

use std::sync::Arc;

use tracing::{debug, info};

use crate::transport::Transport;
use crate::types::ModelDescriptor;

/// Notifications delivered to directory observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// A refresh succeeded and the list now holds this many models.
    ModelsRefreshed(usize),
    /// The selection changed to the named model, or to nothing.
    SelectionChanged(Option<String>),
}

type Observer = Box<dyn FnMut(&DirectoryEvent) + Send>;

/// Best-effort view of the models available on the server.
pub struct ModelDirectory {
    transport: Arc<dyn Transport>,
    available: Vec<ModelDescriptor>,
    selected: Option<ModelDescriptor>,
    observers: Vec<Observer>,
}

impl ModelDirectory {
    /// Create an empty directory. Nothing is fetched until `fetch_models`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            available: Vec::new(),
            selected: None,
            observers: Vec::new(),
        }
    }

    /// Register an observer. Observers run in registration order, inside
    /// the call that changed the directory.
    pub fn subscribe(&mut self, observer: impl FnMut(&DirectoryEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Start with a model selected by name, e.g. from configuration.
    pub fn with_selected(mut self, name: impl Into<String>) -> Self {
        self.selected = Some(ModelDescriptor::named(name));
        self
    }

    /// Refresh the model list from the server.
    ///
    /// On success the list is replaced and, if nothing was selected yet,
    /// the first model becomes the selection. Any failure leaves both the
    /// list and the selection untouched. Either way the current list is
    /// returned. Observers hear about successful refreshes only.
    pub async fn fetch_models(&mut self) -> &[ModelDescriptor] {
        match self.transport.list_models().await {
            Ok(models) => {
                info!(count = models.len(), "refreshed model list");
                let defaulted = self.selected.is_none() && !models.is_empty();
                if defaulted {
                    self.selected = models.first().cloned();
                }
                self.available = models;

                self.notify(DirectoryEvent::ModelsRefreshed(self.available.len()));
                if defaulted {
                    self.notify_selection();
                }
            }
            Err(e) => debug!(error = %e, "model refresh failed, keeping previous list"),
        }
        &self.available
    }

    pub fn available(&self) -> &[ModelDescriptor] {
        &self.available
    }

    pub fn selected(&self) -> Option<&ModelDescriptor> {
        self.selected.as_ref()
    }

    /// Select a listed model by name. Unknown names leave the selection as is.
    pub fn select(&mut self, name: &str) -> bool {
        match self.available.iter().find(|m| m.name == name) {
            Some(model) => {
                self.selected = Some(model.clone());
                self.notify_selection();
                true
            }
            None => false,
        }
    }

    /// Replace the selection without consulting the list.
    pub fn set_selected(&mut self, model: Option<ModelDescriptor>) {
        self.selected = model;
        self.notify_selection();
    }

    fn notify_selection(&mut self) {
        let name = self.selected.as_ref().map(|m| m.name.clone());
        self.notify(DirectoryEvent::SelectionChanged(name));
    }

    fn notify(&mut self, event: DirectoryEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::transport::ByteStream;
    use crate::types::GenerationRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns queued `list_models` results in order.
    struct ScriptedTags {
        responses: Mutex<Vec<Result<Vec<ModelDescriptor>, ClientError>>>,
    }

    impl ScriptedTags {
        fn new(responses: Vec<Result<Vec<ModelDescriptor>, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTags {
        async fn list_models(&self) -> Result<Vec<ModelDescriptor>, ClientError> {
            self.responses.lock().unwrap().remove(0)
        }

        async fn generate(&self, _: &GenerationRequest) -> Result<ByteStream, ClientError> {
            Err(ClientError::Api("not used".to_string()))
        }
    }

    fn models(names: &[&str]) -> Vec<ModelDescriptor> {
        names.iter().map(|n| ModelDescriptor::named(*n)).collect()
    }

    fn record(directory: &mut ModelDirectory) -> Arc<Mutex<Vec<DirectoryEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        directory.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        seen
    }

    #[tokio::test]
    async fn test_first_model_selected_by_default() {
        let transport = ScriptedTags::new(vec![Ok(models(&["a", "b"]))]);
        let mut directory = ModelDirectory::new(transport);

        let listed = directory.fetch_models().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(directory.selected().map(|m| m.name.as_str()), Some("a"));
    }

    #[tokio::test]
    async fn test_existing_selection_kept() {
        let transport = ScriptedTags::new(vec![Ok(models(&["a", "b"])), Ok(models(&["c", "b"]))]);
        let mut directory = ModelDirectory::new(transport);

        directory.fetch_models().await;
        assert!(directory.select("b"));
        directory.fetch_models().await;

        assert_eq!(directory.available(), models(&["c", "b"]).as_slice());
        assert_eq!(directory.selected().map(|m| m.name.as_str()), Some("b"));
    }

    #[tokio::test]
    async fn test_failure_leaves_state_unchanged() {
        let transport = ScriptedTags::new(vec![
            Ok(models(&["a", "b"])),
            Err(ClientError::Api("500 Internal Server Error: boom".to_string())),
        ]);
        let mut directory = ModelDirectory::new(transport);

        directory.fetch_models().await;
        directory.select("b");
        let listed = directory.fetch_models().await.to_vec();

        assert_eq!(listed, models(&["a", "b"]));
        assert_eq!(directory.selected().map(|m| m.name.as_str()), Some("b"));
    }

    #[tokio::test]
    async fn test_configured_model_survives_refresh() {
        let transport = ScriptedTags::new(vec![Ok(models(&["a"]))]);
        let mut directory = ModelDirectory::new(transport).with_selected("custom:latest");

        directory.fetch_models().await;
        assert_eq!(
            directory.selected().map(|m| m.name.as_str()),
            Some("custom:latest")
        );
    }

    #[tokio::test]
    async fn test_select_unknown_model() {
        let transport = ScriptedTags::new(vec![Ok(models(&["a"]))]);
        let mut directory = ModelDirectory::new(transport);

        directory.fetch_models().await;
        assert!(!directory.select("missing"));
        assert_eq!(directory.selected().map(|m| m.name.as_str()), Some("a"));
    }

    #[tokio::test]
    async fn test_refresh_and_default_selection_notify() {
        let transport = ScriptedTags::new(vec![Ok(models(&["a", "b"])), Ok(models(&["c"]))]);
        let mut directory = ModelDirectory::new(transport);
        let seen = record(&mut directory);

        directory.fetch_models().await;
        directory.fetch_models().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                DirectoryEvent::ModelsRefreshed(2),
                DirectoryEvent::SelectionChanged(Some("a".to_string())),
                DirectoryEvent::ModelsRefreshed(1),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_notifies_nothing() {
        let transport = ScriptedTags::new(vec![Err(ClientError::ServerNotRunning(
            "http://127.0.0.1:11434".to_string(),
        ))]);
        let mut directory = ModelDirectory::new(transport);
        let seen = record(&mut directory);

        directory.fetch_models().await;

        assert!(seen.lock().unwrap().is_empty());
        assert!(directory.selected().is_none());
    }

    #[tokio::test]
    async fn test_empty_list_keeps_empty_selection_quiet() {
        let transport = ScriptedTags::new(vec![Ok(Vec::new())]);
        let mut directory = ModelDirectory::new(transport);
        let seen = record(&mut directory);

        directory.fetch_models().await;

        assert_eq!(*seen.lock().unwrap(), vec![DirectoryEvent::ModelsRefreshed(0)]);
    }

    #[tokio::test]
    async fn test_select_notifies_only_known_models() {
        let transport = ScriptedTags::new(vec![Ok(models(&["a", "b"]))]);
        let mut directory = ModelDirectory::new(transport).with_selected("a");
        directory.fetch_models().await;
        let seen = record(&mut directory);

        assert!(directory.select("b"));
        assert!(!directory.select("missing"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![DirectoryEvent::SelectionChanged(Some("b".to_string()))]
        );
    }

    #[test]
    fn test_set_selected_bypasses_list() {
        let transport = ScriptedTags::new(Vec::new());
        let mut directory = ModelDirectory::new(transport);
        let seen = record(&mut directory);

        directory.set_selected(Some(ModelDescriptor::named("offline:7b")));
        assert_eq!(directory.selected().map(|m| m.name.as_str()), Some("offline:7b"));
        assert!(directory.available().is_empty());

        directory.set_selected(None);
        assert!(directory.selected().is_none());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                DirectoryEvent::SelectionChanged(Some("offline:7b".to_string())),
                DirectoryEvent::SelectionChanged(None),
            ]
        );
    }
}
