//! Session lifecycle orchestration.
//!
//! The controller owns the optimistic session flow: drafts live in the
//! local cache and are only written to the store once the user sends a
//! message. State is published through watch channels so frontends can
//! render the active session, the merged list and the loading flag without
//! polling.

use std::sync::{Arc, Mutex as StdMutex};

use confab_core::persona::Persona;
use confab_core::provider::{ChunkSink, HistoryEntry, ResponseProvider};
use confab_core::session::{ChatSession, ChatStore, Message, Sender};
use confab_core::templates;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::session::{LocalSessionCache, ReconciliationEngine, SessionFeed, StreamAccumulator};

/// Coordinates sessions for one signed-in user.
///
/// Nothing here ever surfaces a store or provider failure to the caller;
/// failed writes are logged and the conversation carries on from local
/// state, which the reconciliation engine repairs once the store catches
/// up.
pub struct SessionController {
    user_id: String,
    store: Arc<dyn ChatStore>,
    provider: Arc<dyn ResponseProvider>,
    cache: LocalSessionCache,
    engine: Arc<ReconciliationEngine>,
    feed: StdMutex<Option<SessionFeed>>,
    active_tx: Arc<watch::Sender<Option<ChatSession>>>,
    loading_tx: Arc<watch::Sender<bool>>,
}

impl SessionController {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn ChatStore>,
        provider: Arc<dyn ResponseProvider>,
    ) -> Self {
        let cache = LocalSessionCache::new();
        let engine = Arc::new(ReconciliationEngine::new(cache.clone()));
        let (active_tx, _) = watch::channel(None);
        let (loading_tx, _) = watch::channel(false);
        Self {
            user_id: user_id.into(),
            store,
            provider,
            cache,
            engine,
            feed: StdMutex::new(None),
            active_tx: Arc::new(active_tx),
            loading_tx: Arc::new(loading_tx),
        }
    }

    /// Begins observing the store's session list. Must be called from
    /// within a tokio runtime. Calling it twice is a no-op.
    pub fn start(&self) {
        let mut feed = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        if feed.is_some() {
            debug!("[SessionController] Session feed already running");
            return;
        }
        *feed = Some(SessionFeed::start(
            &self.store,
            &self.user_id,
            Arc::clone(&self.engine),
        ));
        info!(
            "[SessionController] Started session feed for user {}",
            self.user_id
        );
    }

    /// Detaches from the store's session list.
    pub fn shutdown(&self) {
        let feed = self.feed.lock().unwrap_or_else(|e| e.into_inner()).take();
        if feed.is_some() {
            info!("[SessionController] Stopped session feed");
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // ============================================================================
    // Published state
    // ============================================================================

    /// Watch the currently selected session.
    pub fn watch_active(&self) -> watch::Receiver<Option<ChatSession>> {
        self.active_tx.subscribe()
    }

    /// Watch the merged, newest-first session list.
    pub fn watch_sessions(&self) -> watch::Receiver<Vec<ChatSession>> {
        self.engine.merged_sessions()
    }

    /// Watch the waiting-for-first-fragment flag.
    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    /// Snapshot of the currently selected session.
    pub fn active_session(&self) -> Option<ChatSession> {
        self.active_tx.borrow().clone()
    }

    /// Snapshot of the merged session list.
    pub fn session_list(&self) -> Vec<ChatSession> {
        self.engine.current()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading_tx.borrow()
    }

    // ============================================================================
    // Session operations
    // ============================================================================

    /// Selects a fresh draft session, reusing an untouched one if the cache
    /// still holds it so repeated clicks don't pile up empty drafts.
    pub async fn create_session(&self) -> ChatSession {
        for existing in self.cache.list_all().await {
            if existing.is_reusable_draft() {
                debug!(
                    "[SessionController] Reusing draft session {}",
                    existing.id
                );
                self.active_tx.send_replace(Some(existing.clone()));
                return existing;
            }
        }
        let session = ChatSession::draft(self.user_id.as_str());
        info!("[SessionController] Created draft session {}", session.id);
        self.cache.put(session.clone()).await;
        self.engine.refresh().await;
        self.active_tx.send_replace(Some(session.clone()));
        session
    }

    /// Gives the active session a persona. The transcript is reset to the
    /// persona's welcome greeting and the title is derived from its name.
    /// Without an active session this quietly does nothing.
    pub async fn select_persona(&self, persona: Persona) {
        let Some(mut session) = self.active_session() else {
            debug!("[SessionController] No active session, ignoring persona selection");
            return;
        };
        session.title = templates::session_title(&persona.name);
        session.messages = vec![Message::welcome(&persona)];
        session.persona = Some(persona);
        session.touch();
        self.write_back_if_cached(&session).await;
        self.active_tx.send_replace(Some(session));
    }

    /// Makes a session the active one, preferring the local copy over a
    /// store round-trip. Returns whether a session ended up selected.
    pub async fn select_chat(&self, session_id: &str) -> bool {
        if let Some(session) = self.cache.get(session_id).await {
            debug!("[SessionController] Selected cached session {}", session_id);
            self.active_tx.send_replace(Some(session));
            return true;
        }
        match self.store.load_full(session_id, &self.user_id).await {
            Ok(Some(session)) => {
                debug!("[SessionController] Selected remote session {}", session_id);
                self.active_tx.send_replace(Some(session));
                true
            }
            Ok(None) => {
                debug!(
                    "[SessionController] Session {} not found, clearing selection",
                    session_id
                );
                self.active_tx.send_replace(None);
                false
            }
            Err(err) => {
                warn!(
                    "[SessionController] Failed to load session {}: {}",
                    session_id, err
                );
                self.active_tx.send_replace(None);
                false
            }
        }
    }

    /// Deletes a session wherever it lives. Local copies are dropped from
    /// the cache; everything else goes through the store. When the deleted
    /// session was active, selection moves to the most recent remaining
    /// session.
    pub async fn delete_chat(&self, session_id: &str) {
        if self.cache.contains(session_id).await {
            self.cache.remove(session_id).await;
            self.engine.refresh().await;
            info!("[SessionController] Deleted local session {}", session_id);
        } else {
            match self.store.delete(session_id).await {
                Ok(()) => {
                    self.engine.forget_remote(session_id).await;
                    info!("[SessionController] Deleted remote session {}", session_id);
                }
                Err(err) => {
                    warn!(
                        "[SessionController] Delete failed for {}, keeping session: {}",
                        session_id, err
                    );
                    return;
                }
            }
        }

        let was_active = self
            .active_session()
            .map(|s| s.id == session_id)
            .unwrap_or(false);
        if !was_active {
            return;
        }
        match self.engine.current().into_iter().next() {
            Some(next) => {
                debug!("[SessionController] Moving selection to {}", next.id);
                self.select_chat(&next.id).await;
            }
            None => {
                self.active_tx.send_replace(None);
            }
        }
    }

    /// Flips the active session's temporary flag.
    ///
    /// Only allowed while the conversation is still just the welcome
    /// greeting; once real messages exist the persistence mode is locked
    /// in.
    pub async fn toggle_temporary(&self, temporary: bool) {
        let Some(mut session) = self.active_session() else {
            debug!("[SessionController] No active session, ignoring temporary toggle");
            return;
        };
        let welcome_only = session.persona.is_some()
            && session.messages.len() == 1
            && session.messages[0].sender == Sender::Persona;
        if !welcome_only {
            debug!(
                "[SessionController] Session {} already underway, ignoring temporary toggle",
                session.id
            );
            return;
        }
        session.temporary = temporary;
        self.cache.put(session.clone()).await;
        self.engine.refresh().await;
        self.active_tx.send_replace(Some(session));
    }

    /// Sends a user message in the active session and streams the persona's
    /// reply into it.
    ///
    /// The first successful send also writes the session to the store
    /// ("confirmation"); temporary sessions skip that entirely. Store and
    /// provider failures degrade to local-only behavior instead of
    /// propagating.
    pub async fn send_message(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("[SessionController] Ignoring empty message");
            return;
        }
        let Some(session) = self.active_session() else {
            debug!("[SessionController] No active session, dropping message");
            return;
        };
        let Some(persona) = session.persona.clone() else {
            debug!(
                "[SessionController] Session {} has no persona yet, dropping message",
                session.id
            );
            return;
        };

        // Provider context is the conversation before this send.
        let history: Vec<HistoryEntry> = session
            .messages
            .iter()
            .map(|m| HistoryEntry::new(m.sender, m.text.clone()))
            .collect();

        let mut session = session;
        session.messages.push(Message::user(trimmed));
        session.touch();
        self.write_back_if_cached(&session).await;
        self.active_tx.send_replace(Some(session.clone()));
        self.loading_tx.send_replace(true);

        let mut confirmed = false;
        if !session.temporary {
            let exists = match self.store.exists(&session.id, &self.user_id).await {
                Ok(exists) => exists,
                Err(err) => {
                    warn!(
                        "[SessionController] exists() failed for {}: {}",
                        session.id, err
                    );
                    false
                }
            };
            if exists {
                confirmed = true;
            } else {
                match self.store.create(&session).await {
                    Ok(()) => {
                        info!(
                            "[SessionController] Session {} confirmed remotely",
                            session.id
                        );
                        confirmed = true;
                    }
                    Err(err) => {
                        warn!(
                            "[SessionController] Lazy create failed for {}, continuing local-only: {}",
                            session.id, err
                        );
                    }
                }
            }
        }

        let mut accumulator = StreamAccumulator::new(session.clone());
        accumulator.start();
        self.active_tx
            .send_replace(Some(accumulator.session().clone()));

        let accumulator = Arc::new(StdMutex::new(accumulator));
        let sink_acc = Arc::clone(&accumulator);
        let active_tx = Arc::clone(&self.active_tx);
        let loading_tx = Arc::clone(&self.loading_tx);
        let streaming_id = session.id.clone();
        let on_chunk: ChunkSink = Box::new(move |chunk| {
            let mut acc = sink_acc.lock().unwrap_or_else(|e| e.into_inner());
            if acc.push_chunk(&chunk) {
                loading_tx.send_replace(false);
            }
            // Publish only while this session is still the selected one; a
            // finished stream for a deselected session must not yank the
            // view back.
            let still_active = {
                let current = active_tx.borrow();
                current
                    .as_ref()
                    .map(|s| s.id == streaming_id)
                    .unwrap_or(false)
            };
            if still_active {
                active_tx.send_replace(Some(acc.session().clone()));
            }
        });

        let result = self
            .provider
            .stream_generate(&persona, trimmed, &history, on_chunk)
            .await;

        let finalized = {
            let mut acc = accumulator.lock().unwrap_or_else(|e| e.into_inner());
            match &result {
                Ok(()) => acc.complete(),
                Err(err) => {
                    error!(
                        "[SessionController] Streaming failed for {}: {}",
                        session.id, err
                    );
                    acc.fail()
                }
            }
        };
        self.loading_tx.send_replace(false);

        let still_active = {
            let current = self.active_tx.borrow();
            current
                .as_ref()
                .map(|s| s.id == finalized.id)
                .unwrap_or(false)
        };
        if still_active {
            self.active_tx.send_replace(Some(finalized.clone()));
        }
        self.write_back_if_cached(&finalized).await;

        // The trailing update is an upsert, so a clean stream persists even
        // when the earlier create failed. Fallback text is only persisted
        // for sessions the store already knows about.
        if !finalized.temporary && (result.is_ok() || confirmed) {
            if let Err(err) = self.store.update(&finalized).await {
                warn!(
                    "[SessionController] Final update failed for {}: {}",
                    finalized.id, err
                );
            }
        }
    }

    async fn write_back_if_cached(&self, session: &ChatSession) {
        if self.cache.contains(&session.id).await {
            self.cache.put(session.clone()).await;
            self.engine.refresh().await;
        }
    }
}
