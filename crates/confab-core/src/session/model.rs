//! Chat session domain model.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::persona::Persona;
use crate::session::{Message, Sender, SessionMetadata};
use crate::templates;

/// A conversation between the user and a single persona.
///
/// Sessions begin life as local drafts with no persona and no messages.
/// They are only written to the remote store once the user has actually
/// sent a message ("confirmation"), so abandoned drafts never leave the
/// process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,

    /// Selected persona. `None` while the session is still an empty draft,
    /// in which case `messages` is empty as well.
    pub persona: Option<Persona>,

    pub user_id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Temporary sessions are never written to the remote store.
    #[serde(default)]
    pub temporary: bool,
}

impl ChatSession {
    /// Creates an empty draft owned by `user_id`.
    pub fn draft(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_session_id(),
            title: templates::DEFAULT_SESSION_TITLE.to_string(),
            persona: None,
            user_id: user_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            temporary: false,
        }
    }

    /// Display-only projection of a remote listing entry.
    ///
    /// The transcript is not part of the metadata, so `messages` comes back
    /// empty; callers load the full session before showing it.
    pub fn from_metadata(metadata: &SessionMetadata) -> Self {
        Self {
            id: metadata.id.clone(),
            title: metadata.title.clone(),
            persona: metadata.persona.clone(),
            user_id: metadata.user_id.clone(),
            messages: Vec::new(),
            created_at: metadata.created_at,
            updated_at: metadata.updated_at,
            temporary: false,
        }
    }

    /// The listing record for this session.
    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            persona: self.persona.clone(),
            user_id: self.user_id.clone(),
            message_count: self.messages.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Whether the user has sent anything in this session yet.
    pub fn has_user_messages(&self) -> bool {
        self.messages.iter().any(|m| m.sender == Sender::User)
    }

    /// Whether this draft can be handed out again instead of creating a new
    /// one: no persona chosen and nothing sent by the user.
    pub fn is_reusable_draft(&self) -> bool {
        self.persona.is_none() && !self.has_user_messages() && !self.temporary
    }

    /// Bumps `updated_at` to now. Never moves the timestamp backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Generates a session id of the form `chat_{millis}_{suffix}`.
pub fn generate_session_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("chat_{}_{}", millis, suffix.to_lowercase())
}
