//! Application layer for Confab.
//!
//! This crate provides use case implementations that coordinate between
//! domain and infrastructure layers: the session controller with its
//! optimistic local state, and the persona directory.

pub mod persona_directory;
pub mod session;

pub use persona_directory::PersonaDirectory;
pub use session::SessionController;
