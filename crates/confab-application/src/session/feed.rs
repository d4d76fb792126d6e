//! Background pump from store subscriptions into the reconciliation engine.

use std::sync::Arc;

use confab_core::session::{ChatStore, SessionMetadata, SubscriptionHandle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::ReconciliationEngine;

/// Forwards subscription snapshots to the engine from a background task.
///
/// Stores invoke subscription callbacks from whatever context they like,
/// possibly concurrently. The feed only queues snapshots there and applies
/// them in arrival order from a single task, which keeps the at-least-once
/// delivery contract harmless: reapplying a snapshot is a no-op.
pub struct SessionFeed {
    task: JoinHandle<()>,
    _subscription: SubscriptionHandle,
}

impl SessionFeed {
    /// Subscribes to `user_id`'s session list and starts the pump.
    pub fn start(
        store: &Arc<dyn ChatStore>,
        user_id: &str,
        engine: Arc<ReconciliationEngine>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<SessionMetadata>>();
        let subscription = store.subscribe(
            user_id,
            Arc::new(move |snapshot| {
                // A closed channel just means the feed is shutting down.
                let _ = tx.send(snapshot);
            }),
        );
        let task = tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                debug!(
                    target: "session_feed",
                    "Applying remote snapshot ({} sessions)", snapshot.len()
                );
                engine.apply_remote_snapshot(snapshot).await;
            }
            debug!(target: "session_feed", "Snapshot channel closed, feed stopping");
        });
        Self {
            task,
            _subscription: subscription,
        }
    }
}

impl Drop for SessionFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}
