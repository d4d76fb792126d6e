//! Persona domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A character the user can hold a conversation with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique persona identifier
    pub id: String,

    /// Display name, e.g. "Albert Einstein"
    pub name: String,

    /// Short description shown in pickers and woven into prompts
    pub description: String,

    /// Avatar image URL. Empty when no image has been generated yet.
    #[serde(default)]
    pub avatar: String,

    /// Free-form category label, e.g. "Historical Figure"
    pub category: String,
}

impl Persona {
    /// Creates a persona with a fresh id and no avatar.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            avatar: String::new(),
            category: category.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = Persona::new("Ada", "Mathematician", "Historical Figure");
        let b = Persona::new("Ada", "Mathematician", "Historical Figure");
        assert_ne!(a.id, b.id);
        assert!(a.avatar.is_empty());
    }

    #[test]
    fn test_deserialize_without_avatar() {
        let json = r#"{"id":"p","name":"Ada","description":"d","category":"c"}"#;
        let persona: Persona = serde_json::from_str(json).unwrap();
        assert_eq!(persona.avatar, "");
    }
}
