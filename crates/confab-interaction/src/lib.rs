//! Interaction layer for Confab.
//!
//! Talks to the Gemini HTTP API: SSE-streamed in-character chat responses
//! and JSON persona generation. Everything network-facing lives here, behind
//! the provider traits from `confab-core`.

pub mod config;
pub mod gemini;
pub mod prompts;

pub use config::GeminiConfig;
pub use gemini::GeminiProvider;
