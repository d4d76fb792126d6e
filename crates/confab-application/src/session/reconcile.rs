//! Merges remote listings with locally cached sessions.

use std::collections::HashSet;

use confab_core::session::{ChatSession, SessionMetadata};
use tokio::sync::{RwLock, watch};
use tracing::debug;

use crate::session::LocalSessionCache;

/// Keeps the combined, newest-first session list up to date.
///
/// The remote listing is the source of truth for confirmed sessions: once
/// an id shows up in a remote snapshot its local copy is dropped, and the
/// merged list carries the remote entry from then on. Local-only sessions
/// fill the gap until the eventually consistent store catches up.
pub struct ReconciliationEngine {
    cache: LocalSessionCache,
    remote: RwLock<Vec<SessionMetadata>>,
    merged: watch::Sender<Vec<ChatSession>>,
}

impl ReconciliationEngine {
    pub fn new(cache: LocalSessionCache) -> Self {
        let (merged, _) = watch::channel(Vec::new());
        Self {
            cache,
            remote: RwLock::new(Vec::new()),
            merged,
        }
    }

    /// Watch the merged session list. The receiver starts out with the
    /// current value.
    pub fn merged_sessions(&self) -> watch::Receiver<Vec<ChatSession>> {
        self.merged.subscribe()
    }

    /// Current merged list without subscribing.
    pub fn current(&self) -> Vec<ChatSession> {
        self.merged.borrow().clone()
    }

    /// Applies a fresh remote snapshot.
    ///
    /// Any cached session the snapshot now reports is pruned from the local
    /// cache; the remote listing has taken over for it. Snapshots are
    /// applied whole, so redelivery of an identical snapshot is a no-op.
    pub async fn apply_remote_snapshot(&self, snapshot: Vec<SessionMetadata>) {
        let remote_ids: HashSet<&str> = snapshot.iter().map(|m| m.id.as_str()).collect();
        for session in self.cache.list_all().await {
            if remote_ids.contains(session.id.as_str()) {
                debug!(
                    target: "reconcile",
                    "Session {} confirmed remotely, dropping local copy", session.id
                );
                self.cache.remove(&session.id).await;
            }
        }
        *self.remote.write().await = snapshot;
        self.rebuild().await;
    }

    /// Recomputes the merged list after a local cache change.
    pub async fn refresh(&self) {
        self.rebuild().await;
    }

    /// Drops one session from the remembered remote listing without waiting
    /// for the store to push a fresh snapshot. Used after deletes so the
    /// list doesn't briefly resurrect the session.
    pub async fn forget_remote(&self, session_id: &str) {
        self.remote.write().await.retain(|m| m.id != session_id);
        self.rebuild().await;
    }

    async fn rebuild(&self) {
        let remote = self.remote.read().await.clone();
        let remote_ids: HashSet<&str> = remote.iter().map(|m| m.id.as_str()).collect();

        // Local-only sessions go in front so that equal timestamps still
        // list them first. Temporary sessions never appear in the list.
        let mut merged: Vec<ChatSession> = self
            .cache
            .list_all()
            .await
            .into_iter()
            .filter(|s| !remote_ids.contains(s.id.as_str()) && !s.temporary)
            .collect();
        merged.extend(remote.iter().map(ChatSession::from_metadata));
        merged.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        self.merged.send_replace(merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashSet as StdHashSet;

    fn session(user: &str, minutes_ago: i64) -> ChatSession {
        let mut s = ChatSession::draft(user);
        s.updated_at = Utc::now() - Duration::minutes(minutes_ago);
        s
    }

    #[tokio::test]
    async fn test_snapshot_prunes_confirmed_locals() {
        let cache = LocalSessionCache::new();
        let engine = ReconciliationEngine::new(cache.clone());

        let local = session("user-1", 10);
        cache.put(local.clone()).await;

        engine.apply_remote_snapshot(vec![local.metadata()]).await;

        assert!(cache.get(&local.id).await.is_none());
        let merged = engine.current();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, local.id);
        // The surviving entry is the remote projection, not the local copy.
        assert!(merged[0].messages.is_empty());
    }

    #[tokio::test]
    async fn test_merged_ids_are_unique() {
        let cache = LocalSessionCache::new();
        let engine = ReconciliationEngine::new(cache.clone());

        let confirmed = session("user-1", 5);
        let local_only = session("user-1", 1);
        cache.put(confirmed.clone()).await;
        cache.put(local_only.clone()).await;

        engine.apply_remote_snapshot(vec![confirmed.metadata()]).await;

        let merged = engine.current();
        let ids: StdHashSet<&str> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), merged.len());
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn test_merged_list_is_newest_first() {
        let cache = LocalSessionCache::new();
        let engine = ReconciliationEngine::new(cache.clone());

        let old_remote = session("user-1", 30);
        let fresh_local = session("user-1", 1);
        let middle_remote = session("user-1", 15);
        cache.put(fresh_local.clone()).await;

        engine
            .apply_remote_snapshot(vec![old_remote.metadata(), middle_remote.metadata()])
            .await;

        let merged = engine.current();
        let ids: Vec<&str> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![
            fresh_local.id.as_str(),
            middle_remote.id.as_str(),
            old_remote.id.as_str(),
        ]);
    }

    #[tokio::test]
    async fn test_temporary_sessions_stay_out_of_the_list() {
        let cache = LocalSessionCache::new();
        let engine = ReconciliationEngine::new(cache.clone());

        let mut temp = session("user-1", 1);
        temp.temporary = true;
        cache.put(temp.clone()).await;
        let normal = session("user-1", 2);
        cache.put(normal.clone()).await;

        engine.refresh().await;

        let merged = engine.current();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, normal.id);
        // Still cached, just not listed.
        assert!(cache.get(&temp.id).await.is_some());
    }

    #[tokio::test]
    async fn test_forget_remote_removes_entry() {
        let cache = LocalSessionCache::new();
        let engine = ReconciliationEngine::new(cache);

        let a = session("user-1", 1);
        let b = session("user-1", 2);
        engine
            .apply_remote_snapshot(vec![a.metadata(), b.metadata()])
            .await;
        assert_eq!(engine.current().len(), 2);

        engine.forget_remote(&a.id).await;
        let merged = engine.current();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, b.id);
    }

    #[tokio::test]
    async fn test_watch_receiver_sees_updates() {
        let cache = LocalSessionCache::new();
        let engine = ReconciliationEngine::new(cache.clone());
        let mut rx = engine.merged_sessions();
        assert!(rx.borrow().is_empty());

        cache.put(session("user-1", 1)).await;
        engine.refresh().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
