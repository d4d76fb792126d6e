//! Preset-seeded persona catalog.

use async_trait::async_trait;
use confab_core::error::Result;
use confab_core::persona::{Persona, PersonaCatalog};
use tokio::sync::RwLock;

/// Fixed ids for the built-in personas, so the seed set is stable across
/// restarts and can be referenced from saved sessions.
const EINSTEIN_ID: &str = "preset-albert-einstein";
const LOVELACE_ID: &str = "preset-ada-lovelace";
const HOLMES_ID: &str = "preset-sherlock-holmes";
const CURIE_ID: &str = "preset-marie-curie";
const SOCRATES_ID: &str = "preset-socrates";

/// In-memory catalog seeded with the built-in personas.
///
/// Generated personas saved through [`PersonaCatalog::save`] live alongside
/// the presets for the life of the process.
pub struct PresetPersonaCatalog {
    personas: RwLock<Vec<Persona>>,
}

impl PresetPersonaCatalog {
    pub fn new() -> Self {
        Self {
            personas: RwLock::new(default_presets()),
        }
    }

    /// A catalog with no seed personas, for tests.
    pub fn empty() -> Self {
        Self {
            personas: RwLock::new(Vec::new()),
        }
    }
}

impl Default for PresetPersonaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersonaCatalog for PresetPersonaCatalog {
    async fn load_all(&self) -> Result<Vec<Persona>> {
        let mut personas = self.personas.read().await.clone();
        personas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(personas)
    }

    async fn save(&self, persona: &Persona) -> Result<()> {
        let mut personas = self.personas.write().await;
        if let Some(existing) = personas.iter_mut().find(|p| p.id == persona.id) {
            *existing = persona.clone();
        } else {
            personas.push(persona.clone());
        }
        Ok(())
    }
}

/// The built-in persona set every user starts with.
pub fn default_presets() -> Vec<Persona> {
    vec![
        Persona {
            id: EINSTEIN_ID.to_string(),
            name: "Albert Einstein".to_string(),
            description: "Theoretical physicist who developed the theory of relativity and reshaped our understanding of space and time.".to_string(),
            avatar: String::new(),
            category: "Historical Figure".to_string(),
        },
        Persona {
            id: LOVELACE_ID.to_string(),
            name: "Ada Lovelace".to_string(),
            description: "Mathematician regarded as the first computer programmer for her work on the Analytical Engine.".to_string(),
            avatar: String::new(),
            category: "Scientist/Inventor".to_string(),
        },
        Persona {
            id: HOLMES_ID.to_string(),
            name: "Sherlock Holmes".to_string(),
            description: "Brilliant consulting detective famous for sharp observation and deductive reasoning.".to_string(),
            avatar: String::new(),
            category: "Fictional Character".to_string(),
        },
        Persona {
            id: CURIE_ID.to_string(),
            name: "Marie Curie".to_string(),
            description: "Pioneering physicist and chemist, the first person to win Nobel Prizes in two sciences.".to_string(),
            avatar: String::new(),
            category: "Scientist/Inventor".to_string(),
        },
        Persona {
            id: SOCRATES_ID.to_string(),
            name: "Socrates".to_string(),
            description: "Classical Greek philosopher who taught through relentless questioning and honest inquiry.".to_string(),
            avatar: String::new(),
            category: "Philosopher".to_string(),
        },
    ]
}
