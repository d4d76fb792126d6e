//! Versioned DTOs for chat session persistence.

use chrono::{DateTime, Utc};
use confab_core::persona::Persona;
use confab_core::session::{ChatSession, Message};
use serde::{Deserialize, Serialize};
use version_migrate::{IntoDomain, MigratesTo, Versioned};

/// Initial chat session schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct ChatSessionV1_0_0 {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    pub user_id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Adds the `temporary` flag.
///
/// The flag is deliberately not defaulted: a file without it belongs to
/// schema 1.0.0 and must go through the migration chain instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
pub struct ChatSessionV1_1_0 {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    pub user_id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub temporary: bool,
}

impl MigratesTo<ChatSessionV1_1_0> for ChatSessionV1_0_0 {
    fn migrate(self) -> ChatSessionV1_1_0 {
        ChatSessionV1_1_0 {
            id: self.id,
            title: self.title,
            persona: self.persona,
            user_id: self.user_id,
            messages: self.messages,
            created_at: self.created_at,
            updated_at: self.updated_at,
            temporary: false,
        }
    }
}

impl IntoDomain<ChatSession> for ChatSessionV1_1_0 {
    fn into_domain(self) -> ChatSession {
        ChatSession {
            id: self.id,
            title: self.title,
            persona: self.persona,
            user_id: self.user_id,
            messages: self.messages,
            created_at: self.created_at,
            updated_at: self.updated_at,
            temporary: self.temporary,
        }
    }
}

impl version_migrate::FromDomain<ChatSession> for ChatSessionV1_1_0 {
    fn from_domain(session: ChatSession) -> Self {
        let ChatSession {
            id,
            title,
            persona,
            user_id,
            messages,
            created_at,
            updated_at,
            temporary,
        } = session;
        Self {
            id,
            title,
            persona,
            user_id,
            messages,
            created_at,
            updated_at,
            temporary,
        }
    }
}
