//! Session orchestration module.
//!
//! ## Module Structure
//!
//! - [`cache`]: In-process cache of local-only sessions
//! - [`stream`]: Chunk accumulation for streamed replies
//! - [`reconcile`]: Merging remote listings with the local cache
//! - [`feed`]: Background pump from store subscriptions
//! - [`controller`]: The session lifecycle facade

mod cache;
mod controller;
mod feed;
mod reconcile;
mod stream;

pub use cache::LocalSessionCache;
pub use controller::SessionController;
pub use feed::SessionFeed;
pub use reconcile::ReconciliationEngine;
pub use stream::{StreamAccumulator, StreamState};
