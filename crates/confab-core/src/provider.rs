//! Seams to the response-generation backend.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::persona::{AiGeneratedPersona, Persona};
use crate::session::Sender;

/// Receives response fragments as they arrive from the backend.
///
/// Fragments are pushed in order and are never empty. The sink is consumed
/// by the call, so per-response state can live inside the closure.
pub type ChunkSink = Box<dyn FnMut(String) + Send>;

/// A prior conversation turn, as handed to the backend for context.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

/// Errors from the response backend.
///
/// These never abort a conversation; callers substitute fallback content
/// and keep the session usable.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The request never produced an HTTP response
    #[error("Request failed: {message}")]
    Request { message: String, is_retryable: bool },

    /// The backend answered with an error status
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    /// The response stream broke off mid-way
    #[error("Stream interrupted: {0}")]
    Stream(String),

    /// The backend answered, but with something unusable
    #[error("Unusable response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn request(message: impl Into<String>, is_retryable: bool) -> Self {
        Self::Request {
            message: message.into(),
            is_retryable,
        }
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { is_retryable, .. } | Self::Http { is_retryable, .. } => *is_retryable,
            Self::Stream(_) => true,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// Streams in-character responses for a persona conversation.
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    /// Generates a reply to `user_message`, pushing fragments into
    /// `on_chunk` as they arrive. Returns once the response is complete.
    ///
    /// `history` holds the turns before `user_message`, oldest first.
    async fn stream_generate(
        &self,
        persona: &Persona,
        user_message: &str,
        history: &[HistoryEntry],
        on_chunk: ChunkSink,
    ) -> std::result::Result<(), ProviderError>;
}

/// Produces persona suggestions for a search term.
#[async_trait]
pub trait PersonaGenerator: Send + Sync {
    /// Returns validated suggestions for `search_term`. Individual entries
    /// the model got wrong are dropped rather than failing the batch.
    async fn generate_personas(
        &self,
        search_term: &str,
    ) -> std::result::Result<Vec<AiGeneratedPersona>, ProviderError>;
}
