//! Validation of model-generated persona suggestions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfabError, Result};
use crate::persona::Persona;

/// A persona suggestion as decoded from the generation model's output,
/// before it has been validated or assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGeneratedPersona {
    pub name: String,
    pub description: String,
    pub category: String,
}

impl AiGeneratedPersona {
    /// Decodes and validates a single suggestion.
    ///
    /// Name, description and category must all be present and non-empty
    /// after trimming. The returned suggestion carries the trimmed values.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let suggestion: AiGeneratedPersona = serde_json::from_value(value)
            .map_err(|err| ConfabError::validation(format!("Malformed persona suggestion: {}", err)))?;
        suggestion.validated()
    }

    fn validated(self) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConfabError::validation("Persona suggestion has an empty name"));
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ConfabError::validation(format!(
                "Persona suggestion '{}' has an empty description",
                name
            )));
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(ConfabError::validation(format!(
                "Persona suggestion '{}' has an empty category",
                name
            )));
        }
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
        })
    }

    /// Promotes a validated suggestion to a full persona with a fresh id.
    pub fn into_persona(self) -> Persona {
        Persona {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            avatar: String::new(),
            category: self.category,
        }
    }
}
