//! Chat message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persona::Persona;
use crate::templates;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Persona,
}

/// A single message within a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id. Welcome messages use a fixed id, everything else
    /// gets a random one.
    pub id: String,

    /// Message body. Empty while a persona reply is still streaming in.
    pub text: String,

    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A message typed by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
        }
    }

    /// A message spoken by the persona.
    pub fn persona(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender: Sender::Persona,
            timestamp: Utc::now(),
        }
    }

    /// The fixed greeting a persona opens with when first selected.
    pub fn welcome(persona: &Persona) -> Self {
        Self {
            id: templates::WELCOME_MESSAGE_ID.to_string(),
            text: templates::welcome_text(persona),
            sender: Sender::Persona,
            timestamp: Utc::now(),
        }
    }
}
