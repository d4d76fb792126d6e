//! Chat session domain module.
//!
//! ## Module Structure
//!
//! - [`model`]: The `ChatSession` entity and id generation
//! - [`message`]: Messages and their senders
//! - [`metadata`]: The listing projection stores keep per session
//! - [`store`]: The `ChatStore` persistence abstraction
//! - [`subscription`]: Callbacks and handles for live list updates

mod message;
mod metadata;
mod model;
mod store;
mod subscription;

pub use message::{Message, Sender};
pub use metadata::SessionMetadata;
pub use model::{ChatSession, generate_session_id};
pub use store::ChatStore;
pub use subscription::{SnapshotCallback, SubscriptionHandle};
