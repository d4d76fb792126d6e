//! TOML-backed chat store.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use confab_core::error::{ConfabError, Result};
use confab_core::session::{
    ChatSession, ChatStore, SessionMetadata, SnapshotCallback, SubscriptionHandle,
};
use tracing::{debug, info, warn};
use version_migrate::{FromDomain, IntoDomain, MigratesTo};

use crate::dto::{ChatSessionV1_0_0, ChatSessionV1_1_0};
use crate::subscribers::SubscriberRegistry;

/// Chat store persisting each session as its own TOML file.
///
/// Layout:
/// ```text
/// base_dir/
/// └── chats/
///     ├── chat_1700000000000_a1b2c3d4e.toml
///     └── chat_1700000000001_f5g6h7i8j.toml
/// ```
///
/// Files are written in the latest schema version; older files are
/// migrated on read. Subscribers get a fresh owner-scoped snapshot after
/// every visible change, same as the in-memory store.
pub struct TomlChatStore {
    base_dir: PathBuf,
    subscribers: SubscriberRegistry,
}

impl TomlChatStore {
    /// Creates a store rooted at `base_dir`, creating the chats directory
    /// if it does not exist yet.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(base_dir.join("chats"))?;
        Ok(Self {
            base_dir,
            subscribers: SubscriberRegistry::new(),
        })
    }

    /// Creates a store at the platform data directory (`{data_dir}/confab`).
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ConfabError::config("Could not determine the platform data directory"))?;
        Self::new(data_dir.join("confab"))
    }

    fn session_file_path(&self, session_id: &str) -> PathBuf {
        self.base_dir.join("chats").join(format!("{}.toml", session_id))
    }

    /// Reads and decodes one session file, migrating old schemas.
    fn load_session_from_path(&self, path: &Path) -> Result<ChatSession> {
        let content = fs::read_to_string(path)?;

        let dto: ChatSessionV1_1_0 = if let Ok(latest) = toml::from_str::<ChatSessionV1_1_0>(&content)
        {
            latest
        } else if let Ok(v1_0_0) = toml::from_str::<ChatSessionV1_0_0>(&content) {
            info!("Migrating chat session from schema 1.0.0: {:?}", path);
            v1_0_0.migrate()
        } else {
            return Err(ConfabError::migration(format!(
                "Unrecognized chat session schema in {:?}",
                path
            )));
        };

        Ok(dto.into_domain())
    }

    /// Every decodable session on disk. Undecodable files are skipped with
    /// a warning instead of failing the whole listing.
    fn load_all(&self) -> Result<Vec<ChatSession>> {
        let chats_dir = self.base_dir.join("chats");
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&chats_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }
            match self.load_session_from_path(&path) {
                Ok(session) => sessions.push(session),
                Err(err) => warn!("Skipping unreadable session file {:?}: {}", path, err),
            }
        }
        Ok(sessions)
    }

    fn snapshot_for(&self, user_id: &str) -> Result<Vec<SessionMetadata>> {
        let mut list: Vec<SessionMetadata> = self
            .load_all()?
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.metadata())
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    fn write_session(&self, session: &ChatSession) -> Result<()> {
        let dto = ChatSessionV1_1_0::from_domain(session.clone());
        let content = toml::to_string_pretty(&dto)?;
        fs::write(self.session_file_path(&session.id), content)?;
        Ok(())
    }

    fn notify(&self, user_id: &str) {
        match self.snapshot_for(user_id) {
            Ok(snapshot) => self.subscribers.notify(user_id, snapshot),
            Err(err) => warn!("Could not build snapshot for {}: {}", user_id, err),
        }
    }
}

#[async_trait]
impl ChatStore for TomlChatStore {
    async fn load_list(&self, user_id: &str) -> Result<Vec<SessionMetadata>> {
        self.snapshot_for(user_id)
    }

    async fn load_full(&self, session_id: &str, user_id: &str) -> Result<Option<ChatSession>> {
        let path = self.session_file_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let session = self.load_session_from_path(&path)?;
        Ok(Some(session).filter(|s| s.user_id == user_id))
    }

    async fn exists(&self, session_id: &str, user_id: &str) -> Result<bool> {
        Ok(self.load_full(session_id, user_id).await?.is_some())
    }

    async fn create(&self, session: &ChatSession) -> Result<()> {
        debug!("Writing session {} for user {}", session.id, session.user_id);
        self.write_session(session)?;
        self.notify(&session.user_id);
        Ok(())
    }

    async fn update(&self, session: &ChatSession) -> Result<()> {
        self.write_session(session)?;
        self.notify(&session.user_id);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.session_file_path(session_id);
        if !path.exists() {
            return Ok(());
        }
        // The owner is needed for the post-delete snapshot.
        let owner = self.load_session_from_path(&path).ok().map(|s| s.user_id);
        fs::remove_file(&path)?;
        debug!("Deleted session file {:?}", path);
        if let Some(owner) = owner {
            self.notify(&owner);
        }
        Ok(())
    }

    fn subscribe(&self, user_id: &str, callback: SnapshotCallback) -> SubscriptionHandle {
        let handle = self.subscribers.subscribe(user_id, callback.clone());
        match self.snapshot_for(user_id) {
            Ok(snapshot) => callback(snapshot),
            Err(err) => warn!("Initial snapshot for {} failed: {}", user_id, err),
        }
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::persona::Persona;
    use confab_core::session::Message;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn session_for(user_id: &str) -> ChatSession {
        let mut session = ChatSession::draft(user_id);
        session.persona = Some(Persona::new("Ada", "Mathematician.", "Historical Figure"));
        session.messages.push(Message::welcome(
            session.persona.as_ref().unwrap(),
        ));
        session.messages.push(Message::user("hello"));
        session
    }

    #[tokio::test]
    async fn test_create_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();
        let session = session_for("user-1");
        store.create(&session).await.unwrap();

        let loaded = store.load_full(&session.id, "user-1").await.unwrap();
        assert_eq!(loaded.unwrap(), session);
        assert!(store.exists(&session.id, "user-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_ownership_check_hides_foreign_sessions() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();
        let session = session_for("user-1");
        store.create(&session).await.unwrap();

        assert!(store.load_full(&session.id, "user-2").await.unwrap().is_none());
        assert!(!store.exists(&session.id, "user-2").await.unwrap());
        assert!(store.load_list("user-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_list_sorts_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();

        let mut older = session_for("user-1");
        older.updated_at = chrono::Utc::now() - chrono::Duration::minutes(10);
        let newer = session_for("user-1");
        store.create(&older).await.unwrap();
        store.create(&newer).await.unwrap();

        let list = store.load_list("user-1").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newer.id);
        assert_eq!(list[1].id, older.id);
        assert_eq!(list[0].message_count, 2);
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_tolerates_unknown_ids() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();
        let session = session_for("user-1");
        store.create(&session).await.unwrap();

        store.delete(&session.id).await.unwrap();
        assert!(store.load_full(&session.id, "user-1").await.unwrap().is_none());

        store.delete("chat_missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_v1_0_0_file_is_migrated_on_read() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();

        // Hand-written 1.0.0 document: no `temporary` field.
        let content = r#"
id = "chat_1_abcdefghi"
title = "Chat with Ada"
user_id = "user-1"
created_at = "2024-01-01T00:00:00Z"
updated_at = "2024-01-02T00:00:00Z"

[[messages]]
id = "1"
text = "Hello! I'm Ada."
sender = "persona"
timestamp = "2024-01-01T00:00:00Z"
"#;
        fs::write(dir.path().join("chats/chat_1_abcdefghi.toml"), content).unwrap();

        let session = store
            .load_full("chat_1_abcdefghi", "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.title, "Chat with Ada");
        assert_eq!(session.messages.len(), 1);
        assert!(!session.temporary);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped_in_listing() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();
        let session = session_for("user-1");
        store.create(&session).await.unwrap();

        fs::write(dir.path().join("chats/garbage.toml"), "not = valid [ toml").unwrap();

        let list = store.load_list("user-1").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, session.id);
    }

    #[tokio::test]
    async fn test_subscription_sees_initial_state_and_changes() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();

        let received: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let _handle = store.subscribe(
            "user-1",
            Arc::new(move |snapshot| {
                sink.lock().unwrap().push(snapshot.len());
            }),
        );
        assert_eq!(*received.lock().unwrap(), vec![0]);

        let session = session_for("user-1");
        store.create(&session).await.unwrap();
        assert_eq!(*received.lock().unwrap(), vec![0, 1]);

        store.delete(&session.id).await.unwrap();
        assert_eq!(*received.lock().unwrap(), vec![0, 1, 0]);
    }

    #[tokio::test]
    async fn test_update_upserts_missing_sessions() {
        let dir = TempDir::new().unwrap();
        let store = TomlChatStore::new(dir.path()).unwrap();
        let session = session_for("user-1");
        store.update(&session).await.unwrap();
        assert!(store.exists(&session.id, "user-1").await.unwrap());
    }
}
