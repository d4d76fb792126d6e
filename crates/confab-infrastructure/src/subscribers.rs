//! Subscriber registry shared by the chat store implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use confab_core::session::{SessionMetadata, SnapshotCallback, SubscriptionHandle};
use tracing::debug;

/// Tracks list subscribers per user and fans snapshots out to them.
///
/// Callbacks run on the notifying thread with the registry lock released,
/// so a callback is free to subscribe or unsubscribe without deadlocking.
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: Arc<Mutex<HashMap<u64, (String, SnapshotCallback)>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a callback for `user_id`'s session list. The subscription
    /// lives until the returned handle is dropped or unsubscribed.
    pub fn subscribe(&self, user_id: &str, callback: SnapshotCallback) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, (user_id.to_string(), callback));
        debug!("Subscriber {} registered for user {}", id, user_id);

        let subscribers = Arc::clone(&self.subscribers);
        SubscriptionHandle::new(move || {
            subscribers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&id);
            debug!("Subscriber {} detached", id);
        })
    }

    /// Delivers a snapshot to every subscriber watching `user_id`.
    pub fn notify(&self, user_id: &str, snapshot: Vec<SessionMetadata>) {
        let callbacks: Vec<SnapshotCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|(owner, _)| owner.as_str() == user_id)
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(snapshot.clone());
        }
    }

    /// Number of live subscriptions across all users.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
