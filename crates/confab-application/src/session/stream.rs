//! Accumulates a streamed persona reply into its placeholder message.

use confab_core::session::{ChatSession, Message};
use confab_core::templates;

/// Where a streamed response currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, placeholder not yet appended
    Idle,
    /// Placeholder appended, fragments being applied
    Streaming,
    /// Response finished cleanly
    Complete,
    /// Backend failed, placeholder holds the fallback text
    Errored,
}

/// Builds up the persona reply for one send, chunk by chunk.
///
/// The accumulator owns a working copy of the session. Every applied chunk
/// rewrites the placeholder message from the full accumulated text, so a
/// snapshot taken between any two chunks is a well-formed session whose
/// last message simply isn't finished yet.
pub struct StreamAccumulator {
    session: ChatSession,
    placeholder_id: Option<String>,
    accumulated: String,
    state: StreamState,
}

impl StreamAccumulator {
    /// Wraps a session that already contains the user's message.
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            placeholder_id: None,
            accumulated: String::new(),
            state: StreamState::Idle,
        }
    }

    /// Appends the empty placeholder message and enters `Streaming`.
    pub fn start(&mut self) {
        if self.state != StreamState::Idle {
            return;
        }
        let placeholder = Message::persona("");
        self.placeholder_id = Some(placeholder.id.clone());
        self.session.messages.push(placeholder);
        self.state = StreamState::Streaming;
    }

    /// Applies one response fragment.
    ///
    /// Returns `true` when this was the first fragment of the response,
    /// which is the moment callers stop showing a loading indicator.
    pub fn push_chunk(&mut self, chunk: &str) -> bool {
        if self.state != StreamState::Streaming {
            return false;
        }
        let first = self.accumulated.is_empty();
        self.accumulated.push_str(chunk);
        let text = self.accumulated.clone();
        self.write_placeholder(text);
        first
    }

    /// Marks the response finished and returns the final session.
    pub fn complete(&mut self) -> ChatSession {
        if self.state == StreamState::Streaming {
            self.state = StreamState::Complete;
        }
        self.session.clone()
    }

    /// Replaces whatever accumulated with the fixed failure text, wholesale,
    /// and returns the final session.
    pub fn fail(&mut self) -> ChatSession {
        if self.state == StreamState::Streaming {
            self.state = StreamState::Errored;
            self.write_placeholder(templates::STREAM_FAILURE_TEXT.to_string());
        }
        self.session.clone()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The session as it currently stands, placeholder included.
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Full response text applied so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    fn write_placeholder(&mut self, text: String) {
        let Some(id) = &self.placeholder_id else {
            return;
        };
        if let Some(message) = self.session.messages.iter_mut().find(|m| &m.id == id) {
            message.text = text;
        }
    }
}
