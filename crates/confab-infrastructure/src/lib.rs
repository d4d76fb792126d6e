//! Infrastructure layer for Confab.
//!
//! Concrete implementations of the storage seams defined in `confab-core`:
//! an in-memory chat store for tests and ephemeral runs, a TOML
//! file-per-session store for durable local persistence, and the preset
//! persona catalog.

pub mod dto;
pub mod memory_chat_store;
pub mod preset_catalog;
pub mod subscribers;
pub mod toml_chat_store;

pub use memory_chat_store::MemoryChatStore;
pub use preset_catalog::PresetPersonaCatalog;
pub use subscribers::SubscriberRegistry;
pub use toml_chat_store::TomlChatStore;
