//! Persona domain module.
//!
//! ## Module Structure
//!
//! - [`model`]: The `Persona` entity
//! - [`catalog`]: The `PersonaCatalog` storage abstraction
//! - [`generated`]: Validation of model-generated persona suggestions

mod catalog;
mod generated;
mod model;

pub use catalog::PersonaCatalog;
pub use generated::AiGeneratedPersona;
pub use model::Persona;
