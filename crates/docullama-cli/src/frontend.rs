//! Terminal rendering of a model directory plus generation session.

use std::io::Write;
use std::sync::Arc;

use docullama_client::{
    ClientConfig, GenerationSession, ModelDescriptor, ModelDirectory, OllamaClient, SessionEvent,
};

/// Everything the front-end needs for one server.
pub(crate) struct Frontend {
    pub config: ClientConfig,
    pub client: Arc<OllamaClient>,
    pub directory: ModelDirectory,
    pub session: GenerationSession,
}

/// How a followed stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Cancelled,
}

impl Frontend {
    /// Build the client stack for `config`. Nothing is fetched yet.
    pub fn connect(config: ClientConfig) -> Self {
        let client = Arc::new(OllamaClient::from_config(&config));

        let mut directory = ModelDirectory::new(client.clone());
        if let Some(model) = &config.model {
            directory = directory.with_selected(model.clone());
        }

        let mut session = GenerationSession::new(client.clone());
        session.subscribe(render);

        Self {
            config,
            client,
            directory,
            session,
        }
    }

    /// Point at a different server, keeping the model choice and template.
    pub fn switch_server(&mut self, url: &str) {
        let selected = self.directory.selected().cloned();
        let mut config = self.config.clone();
        config.base_url = docullama_client::normalize_base_url(url);
        config.model = selected.as_ref().map(|m| m.name.clone());
        *self = Self::connect(config);
        self.directory.set_selected(selected);
    }

    pub async fn refresh_models(&mut self) -> &[ModelDescriptor] {
        self.directory.fetch_models().await
    }

    pub fn selected(&self) -> Option<&ModelDescriptor> {
        self.directory.selected()
    }

    /// Send `prompt` and stream the answer to stdout until it ends or
    /// Ctrl-C cancels it. Returns `None` when nothing was sent.
    pub async fn ask(&mut self, prompt: &str) -> Option<Outcome> {
        let model = self.directory.selected().cloned();
        self.session
            .send(prompt, model.as_ref(), &self.config.template)?;
        Some(follow(&mut self.session).await)
    }
}

/// Apply stream events until the request finishes; Ctrl-C cancels it.
pub(crate) async fn follow(session: &mut GenerationSession) -> Outcome {
    while session.is_streaming() {
        tokio::select! {
            applied = session.next_event() => {
                if !applied {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                session.cancel();
                return Outcome::Cancelled;
            }
        }
    }
    Outcome::Completed
}

/// Session observer: stdout mirrors the accumulated response exactly.
fn render(event: &SessionEvent) {
    let mut stdout = std::io::stdout().lock();
    match event {
        SessionEvent::TextAppended(text) => {
            let _ = write!(stdout, "{}", text);
        }
        SessionEvent::Completed { error: Some(error) } => {
            let _ = write!(stdout, "\nError: {}", error);
        }
        SessionEvent::Cancelled => {
            eprintln!("\n[stopped]");
        }
        SessionEvent::Started(_) | SessionEvent::Completed { error: None } | SessionEvent::Cleared => {}
    }
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_server_keeps_selection_and_template() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:11434")
            .model("llama3.2:latest")
            .template("Explain: ")
            .build();
        let mut frontend = Frontend::connect(config);

        frontend.switch_server("gpu-box:11434/");

        assert_eq!(frontend.client.base_url(), "http://gpu-box:11434");
        assert_eq!(frontend.config.base_url, "http://gpu-box:11434");
        assert_eq!(frontend.config.template, "Explain: ");
        assert_eq!(
            frontend.selected().map(|m| m.name.as_str()),
            Some("llama3.2:latest")
        );
    }

    #[test]
    fn test_switch_server_without_selection() {
        let mut frontend = Frontend::connect(ClientConfig::default());

        frontend.switch_server("http://10.0.0.2:11434");

        assert!(frontend.selected().is_none());
        assert_eq!(frontend.config.model, None);
    }
}
