//! Remote persistence seam for chat sessions.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::{ChatSession, SessionMetadata, SnapshotCallback, SubscriptionHandle};

/// Remote, eventually consistent store of confirmed sessions.
///
/// Listing metadata and full transcripts are persisted as separate records,
/// so a freshly written session may take a moment to show up in list
/// results and subscription snapshots. Callers are expected to keep their
/// own local state and reconcile against what the store reports.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Lists sessions owned by `user_id`, newest first by `updated_at`.
    async fn load_list(&self, user_id: &str) -> Result<Vec<SessionMetadata>>;

    /// Loads a full session.
    ///
    /// Returns `None` when the session does not exist or is owned by a
    /// different user; ownership failures are indistinguishable from
    /// missing sessions on purpose.
    async fn load_full(&self, session_id: &str, user_id: &str) -> Result<Option<ChatSession>>;

    /// Whether a session exists and is owned by `user_id`.
    async fn exists(&self, session_id: &str, user_id: &str) -> Result<bool>;

    /// Writes a session for the first time. Writing an id that already
    /// exists replaces it; create and update are both upserts.
    async fn create(&self, session: &ChatSession) -> Result<()>;

    /// Rewrites a session, creating it if it has gone missing.
    async fn update(&self, session: &ChatSession) -> Result<()>;

    /// Removes a session and its listing entry. Deleting an id that does
    /// not exist is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Registers a listener for the owner's session list.
    ///
    /// The callback fires once with the current state and again after every
    /// visible change, at least once per change. The subscription stays
    /// alive until the returned handle is dropped or unsubscribed.
    fn subscribe(&self, user_id: &str, callback: SnapshotCallback) -> SubscriptionHandle;
}
