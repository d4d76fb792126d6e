//! Persona Directory Service
//!
//! Combines the persona catalog with the generation backend: callers can
//! list what already exists and discover new personas from a search term,
//! with successful discoveries saved back into the catalog.

use std::sync::Arc;

use confab_core::error::{ConfabError, Result};
use confab_core::persona::{Persona, PersonaCatalog};
use confab_core::provider::PersonaGenerator;
use tracing::{debug, warn};

/// Service for browsing and growing the persona catalog.
pub struct PersonaDirectory {
    catalog: Arc<dyn PersonaCatalog>,
    generator: Arc<dyn PersonaGenerator>,
}

impl PersonaDirectory {
    pub fn new(catalog: Arc<dyn PersonaCatalog>, generator: Arc<dyn PersonaGenerator>) -> Self {
        Self { catalog, generator }
    }

    /// All selectable personas, sorted by name.
    pub async fn list(&self) -> Result<Vec<Persona>> {
        self.catalog.load_all().await
    }

    /// Generates personas for a search term and saves them to the catalog.
    ///
    /// Suggestions the model produced but the catalog could not store are
    /// still returned; the catalog is a convenience, not a gatekeeper.
    pub async fn discover(&self, search_term: &str) -> Result<Vec<Persona>> {
        let suggestions = self
            .generator
            .generate_personas(search_term)
            .await
            .map_err(|err| {
                ConfabError::data_access(format!("Persona generation failed: {}", err))
            })?;
        debug!(
            "[PersonaDirectory] Generated {} suggestions for '{}'",
            suggestions.len(),
            search_term
        );

        let mut personas = Vec::with_capacity(suggestions.len());
        for suggestion in suggestions {
            let persona = suggestion.into_persona();
            if let Err(err) = self.catalog.save(&persona).await {
                warn!(
                    "[PersonaDirectory] Could not save persona '{}': {}",
                    persona.name, err
                );
            }
            personas.push(persona);
        }
        Ok(personas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use confab_core::persona::AiGeneratedPersona;
    use confab_core::provider::ProviderError;
    use std::sync::Mutex;

    struct VecCatalog {
        personas: Mutex<Vec<Persona>>,
        fail_save: bool,
    }

    impl VecCatalog {
        fn new() -> Self {
            Self {
                personas: Mutex::new(Vec::new()),
                fail_save: false,
            }
        }
    }

    #[async_trait]
    impl PersonaCatalog for VecCatalog {
        async fn load_all(&self) -> Result<Vec<Persona>> {
            let mut personas = self.personas.lock().unwrap().clone();
            personas.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(personas)
        }

        async fn save(&self, persona: &Persona) -> Result<()> {
            if self.fail_save {
                return Err(ConfabError::data_access("save failed"));
            }
            self.personas.lock().unwrap().push(persona.clone());
            Ok(())
        }
    }

    struct FixedGenerator {
        suggestions: Vec<AiGeneratedPersona>,
        fail: bool,
    }

    #[async_trait]
    impl PersonaGenerator for FixedGenerator {
        async fn generate_personas(
            &self,
            _search_term: &str,
        ) -> std::result::Result<Vec<AiGeneratedPersona>, ProviderError> {
            if self.fail {
                return Err(ProviderError::request("backend down", true));
            }
            Ok(self.suggestions.clone())
        }
    }

    fn suggestion(name: &str) -> AiGeneratedPersona {
        AiGeneratedPersona {
            name: name.to_string(),
            description: "A generated persona.".to_string(),
            category: "Fictional Character".to_string(),
        }
    }

    #[tokio::test]
    async fn test_discover_saves_and_returns_personas() {
        let catalog = Arc::new(VecCatalog::new());
        let generator = Arc::new(FixedGenerator {
            suggestions: vec![suggestion("Ada"), suggestion("Alan")],
            fail: false,
        });
        let directory = PersonaDirectory::new(
            Arc::clone(&catalog) as Arc<dyn PersonaCatalog>,
            generator as Arc<dyn PersonaGenerator>,
        );

        let personas = directory.discover("computing").await.unwrap();
        assert_eq!(personas.len(), 2);
        assert!(personas.iter().all(|p| !p.id.is_empty()));
        assert_eq!(directory.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_discover_survives_catalog_failures() {
        let catalog = Arc::new(VecCatalog {
            personas: Mutex::new(Vec::new()),
            fail_save: true,
        });
        let generator = Arc::new(FixedGenerator {
            suggestions: vec![suggestion("Ada")],
            fail: false,
        });
        let directory = PersonaDirectory::new(
            catalog as Arc<dyn PersonaCatalog>,
            generator as Arc<dyn PersonaGenerator>,
        );

        let personas = directory.discover("computing").await.unwrap();
        assert_eq!(personas.len(), 1);
    }

    #[tokio::test]
    async fn test_discover_propagates_generator_failure() {
        let catalog = Arc::new(VecCatalog::new());
        let generator = Arc::new(FixedGenerator {
            suggestions: Vec::new(),
            fail: true,
        });
        let directory = PersonaDirectory::new(
            catalog as Arc<dyn PersonaCatalog>,
            generator as Arc<dyn PersonaGenerator>,
        );

        let err = directory.discover("computing").await.unwrap_err();
        assert!(matches!(err, ConfabError::DataAccess(_)));
    }
}
