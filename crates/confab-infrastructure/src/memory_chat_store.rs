//! In-memory chat store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use confab_core::error::Result;
use confab_core::session::{
    ChatSession, ChatStore, SessionMetadata, SnapshotCallback, SubscriptionHandle,
};
use tracing::debug;

use crate::subscribers::SubscriberRegistry;

/// Chat store backed by a plain in-process map.
///
/// Useful for tests and offline runs. It honors the same contract as the
/// durable stores: owner-scoped listings, upserting writes and a snapshot
/// to subscribers after every visible change.
pub struct MemoryChatStore {
    sessions: Mutex<HashMap<String, ChatSession>>,
    subscribers: SubscriberRegistry,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            subscribers: SubscriberRegistry::new(),
        }
    }

    fn snapshot_for(&self, user_id: &str) -> Vec<SessionMetadata> {
        let mut list: Vec<SessionMetadata> = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.metadata())
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    fn get(&self, session_id: &str) -> Option<ChatSession> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
    }

    fn insert(&self, session: &ChatSession) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.id.clone(), session.clone());
        self.subscribers
            .notify(&session.user_id, self.snapshot_for(&session.user_id));
    }
}

impl Default for MemoryChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn load_list(&self, user_id: &str) -> Result<Vec<SessionMetadata>> {
        Ok(self.snapshot_for(user_id))
    }

    async fn load_full(&self, session_id: &str, user_id: &str) -> Result<Option<ChatSession>> {
        Ok(self.get(session_id).filter(|s| s.user_id == user_id))
    }

    async fn exists(&self, session_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .get(session_id)
            .map(|s| s.user_id == user_id)
            .unwrap_or(false))
    }

    async fn create(&self, session: &ChatSession) -> Result<()> {
        debug!("Storing session {} for user {}", session.id, session.user_id);
        self.insert(session);
        Ok(())
    }

    async fn update(&self, session: &ChatSession) -> Result<()> {
        self.insert(session);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_id);
        if let Some(removed) = removed {
            debug!("Deleted session {}", session_id);
            self.subscribers
                .notify(&removed.user_id, self.snapshot_for(&removed.user_id));
        }
        Ok(())
    }

    fn subscribe(&self, user_id: &str, callback: SnapshotCallback) -> SubscriptionHandle {
        let handle = self.subscribers.subscribe(user_id, callback.clone());
        callback(self.snapshot_for(user_id));
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::persona::Persona;
    use confab_core::session::Message;
    use std::sync::Arc;

    fn session_for(user_id: &str) -> ChatSession {
        let mut session = ChatSession::draft(user_id);
        session.persona = Some(Persona::new("Ada", "Mathematician.", "Historical Figure"));
        session.messages.push(Message::user("hello"));
        session
    }

    #[tokio::test]
    async fn test_create_then_load_full() {
        let store = MemoryChatStore::new();
        let session = session_for("user-1");
        store.create(&session).await.unwrap();

        let loaded = store.load_full(&session.id, "user-1").await.unwrap();
        assert_eq!(loaded.unwrap(), session);
        assert!(store.exists(&session.id, "user-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_scoping_hides_foreign_sessions() {
        let store = MemoryChatStore::new();
        let session = session_for("user-1");
        store.create(&session).await.unwrap();

        assert!(store.load_full(&session.id, "user-2").await.unwrap().is_none());
        assert!(!store.exists(&session.id, "user-2").await.unwrap());
        assert!(store.load_list("user-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_list_is_sorted_newest_first() {
        let store = MemoryChatStore::new();
        let mut older = session_for("user-1");
        older.updated_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        let newer = session_for("user-1");
        store.create(&older).await.unwrap();
        store.create(&newer).await.unwrap();

        let list = store.load_list("user-1").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newer.id);
        assert_eq!(list[1].id, older.id);
        assert_eq!(list[0].message_count, 1);
    }

    #[tokio::test]
    async fn test_update_upserts_missing_sessions() {
        let store = MemoryChatStore::new();
        let session = session_for("user-1");
        store.update(&session).await.unwrap();
        assert!(store.exists(&session.id, "user-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_ok() {
        let store = MemoryChatStore::new();
        store.delete("chat_missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_subscription_gets_initial_and_change_snapshots() {
        let store = MemoryChatStore::new();
        let received: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let handle = store.subscribe(
            "user-1",
            Arc::new(move |snapshot| {
                sink.lock().unwrap().push(snapshot.len());
            }),
        );

        // Initial snapshot of the empty store.
        assert_eq!(*received.lock().unwrap(), vec![0]);

        let session = session_for("user-1");
        store.create(&session).await.unwrap();
        assert_eq!(*received.lock().unwrap(), vec![0, 1]);

        // Changes to another user's sessions are invisible.
        store.create(&session_for("user-2")).await.unwrap();
        assert_eq!(*received.lock().unwrap(), vec![0, 1]);

        handle.unsubscribe();
        store.delete(&session.id).await.unwrap();
        assert_eq!(*received.lock().unwrap(), vec![0, 1]);
    }
}
