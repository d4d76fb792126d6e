//! Subscription plumbing for session list updates.

use std::fmt;
use std::sync::Arc;

use crate::session::SessionMetadata;

/// Callback invoked with a fresh snapshot of the owner's session list.
///
/// Snapshots are delivered at least once per visible change and may arrive
/// from arbitrary threads, so implementations must be cheap and re-entrant.
pub type SnapshotCallback = Arc<dyn Fn(Vec<SessionMetadata>) + Send + Sync>;

/// Detaches a list subscription when dropped or explicitly unsubscribed.
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle that detaches nothing, for stores without live feeds.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Stops further snapshot deliveries. Dropping the handle does the same.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
