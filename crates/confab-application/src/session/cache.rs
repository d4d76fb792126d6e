//! In-process cache of sessions that exist only locally.

use std::collections::HashMap;
use std::sync::Arc;

use confab_core::session::ChatSession;
use tokio::sync::RwLock;

/// Draft and temporary sessions keyed by id.
///
/// Cloning the cache is cheap and every clone sees the same map, so the
/// controller, the reconciliation engine and tests can all share one.
#[derive(Clone)]
pub struct LocalSessionCache {
    sessions: Arc<RwLock<HashMap<String, ChatSession>>>,
}

impl LocalSessionCache {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Inserts or replaces a session under its id.
    pub async fn put(&self, session: ChatSession) {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
    }

    /// Returns a copy of the session, if cached.
    pub async fn get(&self, session_id: &str) -> Option<ChatSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Removes a session. Removing an unknown id is a no-op.
    pub async fn remove(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// All cached sessions, in no particular order.
    pub async fn list_all(&self) -> Vec<ChatSession> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for LocalSessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_remove() {
        let cache = LocalSessionCache::new();
        let session = ChatSession::draft("user-1");
        let id = session.id.clone();

        cache.put(session.clone()).await;
        assert!(cache.contains(&id).await);
        assert_eq!(cache.get(&id).await.unwrap().id, id);

        cache.remove(&id).await;
        assert!(cache.get(&id).await.is_none());
        // Removing again is fine.
        cache.remove(&id).await;
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let cache = LocalSessionCache::new();
        let mut session = ChatSession::draft("user-1");
        cache.put(session.clone()).await;

        session.title = "Chat with Ada".to_string();
        cache.put(session.clone()).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&session.id).await.unwrap().title, "Chat with Ada");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = LocalSessionCache::new();
        let clone = cache.clone();
        let session = ChatSession::draft("user-1");
        let id = session.id.clone();

        cache.put(session).await;
        assert!(clone.contains(&id).await);
        assert_eq!(clone.list_all().await.len(), 1);
    }
}
