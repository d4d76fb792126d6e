//! Listing projection of a chat session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persona::Persona;

/// The lightweight record a store keeps per session for list views.
///
/// Metadata deliberately omits the message bodies; subscription feeds push
/// these around frequently and full transcripts would make that expensive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    pub title: String,
    pub persona: Option<Persona>,
    pub user_id: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
