//! Generation session: one streaming request at a time.
//!
//! ```text
//!            send()                  on_completed() / cancel()
//!   Idle ───────────────> Streaming ───────────────────────────> Idle
//!                          │    ^
//!                          └────┘ on_chunk_received()
//! ```
//!
//! The request runs on a spawned tokio task. That task never touches the
//! session state; it forwards body chunks and its completion through an
//! unbounded channel, and the owner of the session applies them one at a
//! time via [`GenerationSession::next_event`]. Every message carries the
//! [`RequestId`] of the send that produced it, so anything still in flight
//! from a cancelled or superseded request is ignored.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::decoder::StreamDecoder;
use crate::transport::Transport;
use crate::types::{GenerationRequest, ModelDescriptor};

/// Identity of one accepted `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State observed by the front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Text accumulated for the current (or last) request
    pub response: String,
    /// Whether a request is in flight
    pub streaming: bool,
    /// Stream lines that could not be decoded during the current request
    pub dropped_lines: usize,
}

/// Notifications delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A send was accepted; the response was cleared.
    Started(RequestId),
    /// A decoded fragment was appended to the response.
    TextAppended(String),
    /// The stream ended. `error` is the text appended as a trailer, if any.
    Completed { error: Option<String> },
    /// The in-flight request was cancelled.
    Cancelled,
    /// The response was cleared while idle.
    Cleared,
}

/// Message from the transport task.
#[derive(Debug)]
enum StreamMessage {
    Chunk(RequestId, Bytes),
    Completed(RequestId, Option<String>),
}

struct ActiveRequest {
    id: RequestId,
    task: JoinHandle<()>,
}

type Observer = Box<dyn FnMut(&SessionEvent) + Send>;

/// Owns the single in-flight or idle streaming generation.
pub struct GenerationSession {
    transport: Arc<dyn Transport>,
    state: SessionState,
    decoder: StreamDecoder,
    active: Option<ActiveRequest>,
    next_id: u64,
    tx: mpsc::UnboundedSender<StreamMessage>,
    rx: mpsc::UnboundedReceiver<StreamMessage>,
    observers: Vec<Observer>,
}

impl GenerationSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            transport,
            state: SessionState::default(),
            decoder: StreamDecoder::new(),
            active: None,
            next_id: 0,
            tx,
            rx,
            observers: Vec::new(),
        }
    }

    /// Register an observer. Observers run in registration order, on the
    /// task that applies the event.
    pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn response(&self) -> &str {
        &self.state.response
    }

    pub fn is_streaming(&self) -> bool {
        self.state.streaming
    }

    pub fn active_request(&self) -> Option<RequestId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Start streaming a generation for `template + prompt`.
    ///
    /// Returns `None` without touching any state when the prompt is empty,
    /// a request is already streaming, or no model is selected. Must be
    /// called from within a tokio runtime.
    pub fn send(
        &mut self,
        prompt: &str,
        model: Option<&ModelDescriptor>,
        template: &str,
    ) -> Option<RequestId> {
        if prompt.is_empty() {
            debug!("ignoring send: empty prompt");
            return None;
        }
        if self.state.streaming {
            debug!("ignoring send: a request is already streaming");
            return None;
        }
        let Some(model) = model else {
            debug!("ignoring send: no model selected");
            return None;
        };

        self.next_id += 1;
        let id = RequestId(self.next_id);

        self.state.response.clear();
        self.state.streaming = true;
        self.state.dropped_lines = 0;
        self.decoder.reset();

        let request = GenerationRequest::new(model.name.clone(), template, prompt);
        info!(request = %id, model = %request.model, "sending prompt");

        let task = tokio::spawn(drive(self.transport.clone(), request, id, self.tx.clone()));
        self.active = Some(ActiveRequest { id, task });

        self.notify(SessionEvent::Started(id));
        Some(id)
    }

    /// Feed body bytes of request `id` through the line decoder.
    pub fn on_chunk_received(&mut self, id: RequestId, bytes: &[u8]) {
        if !self.is_current(id) {
            debug!(request = %id, len = bytes.len(), "ignoring chunk for stale request");
            return;
        }

        let decoded = self.decoder.push(bytes);
        self.state.dropped_lines += decoded.dropped;

        for chunk in decoded.chunks {
            if chunk.response.is_empty() {
                continue;
            }
            self.state.response.push_str(&chunk.response);
            self.notify(SessionEvent::TextAppended(chunk.response));
        }
    }

    /// Finish request `id`, appending `error` to the response if present.
    pub fn on_completed(&mut self, id: RequestId, error: Option<String>) {
        if !self.is_current(id) {
            debug!(request = %id, "ignoring completion for stale request");
            return;
        }

        let tail = self.decoder.finish();
        if !tail.is_empty() {
            debug!(request = %id, len = tail.len(), "dropping unterminated final line");
            self.state.dropped_lines += 1;
        }

        self.active = None;
        self.state.streaming = false;
        if let Some(error) = &error {
            self.state.response.push_str("\nError: ");
            self.state.response.push_str(error);
        }

        info!(
            request = %id,
            chars = self.state.response.len(),
            dropped_lines = self.state.dropped_lines,
            failed = error.is_some(),
            "generation finished"
        );
        self.notify(SessionEvent::Completed { error });
    }

    /// Abort the in-flight request. Text received so far is kept.
    pub fn cancel(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        active.task.abort();
        self.state.streaming = false;
        self.decoder.reset();

        info!(request = %active.id, "generation cancelled");
        self.notify(SessionEvent::Cancelled);
        true
    }

    /// Empty the response. Does nothing while streaming.
    pub fn clear(&mut self) -> bool {
        if self.state.streaming {
            return false;
        }
        self.state.response.clear();
        self.state.dropped_lines = 0;
        self.notify(SessionEvent::Cleared);
        true
    }

    /// Apply the next message from the transport task.
    ///
    /// Waits while a request is active. When idle, drains leftover messages
    /// from earlier requests and returns `false`. Cancel-safe, so it can
    /// sit in a `tokio::select!` next to a cancel trigger.
    pub async fn next_event(&mut self) -> bool {
        if self.active.is_none() {
            while let Ok(message) = self.rx.try_recv() {
                self.apply(message);
            }
            return false;
        }

        match self.rx.recv().await {
            Some(message) => {
                self.apply(message);
                true
            }
            None => false,
        }
    }

    /// Apply messages until the active request completes or is cancelled.
    pub async fn run_to_completion(&mut self) {
        while self.state.streaming {
            if !self.next_event().await {
                break;
            }
        }
    }

    fn apply(&mut self, message: StreamMessage) {
        match message {
            StreamMessage::Chunk(id, bytes) => self.on_chunk_received(id, &bytes),
            StreamMessage::Completed(id, error) => self.on_completed(id, error),
        }
    }

    fn is_current(&self, id: RequestId) -> bool {
        self.state.streaming && self.active_request() == Some(id)
    }

    fn notify(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.task.abort();
        }
    }
}

/// Run one request, forwarding its body and completion to the session.
async fn drive(
    transport: Arc<dyn Transport>,
    request: GenerationRequest,
    id: RequestId,
    tx: mpsc::UnboundedSender<StreamMessage>,
) {
    let error = match transport.generate(&request).await {
        Ok(mut stream) => {
            let mut error = None;
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        if tx.send(StreamMessage::Chunk(id, bytes)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        error = Some(e.to_string());
                        break;
                    }
                }
            }
            error
        }
        Err(e) => Some(e.to_string()),
    };

    let _ = tx.send(StreamMessage::Completed(id, error));
}
