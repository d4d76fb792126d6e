//! Persona catalog abstraction.

use async_trait::async_trait;

use crate::error::Result;
use crate::persona::Persona;

/// Shared catalog of selectable personas.
///
/// Implementations back this with whatever storage they like; the
/// application only relies on name-sorted listings and upsert-by-id saves.
#[async_trait]
pub trait PersonaCatalog: Send + Sync {
    /// Returns every persona in the catalog, sorted by name.
    async fn load_all(&self) -> Result<Vec<Persona>>;

    /// Inserts the persona, replacing any existing entry with the same id.
    async fn save(&self, persona: &Persona) -> Result<()>;
}
