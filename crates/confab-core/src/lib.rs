//! Core domain model for Confab: chat sessions, messages, personas, and
//! the seams to session storage and response generation.
//!
//! Nothing in this crate talks to the network or the filesystem; concrete
//! stores and providers live in the infrastructure and interaction crates.

pub mod error;
pub mod persona;
pub mod provider;
pub mod session;
pub mod templates;

// Re-export common error type
pub use error::{ConfabError, Result};
