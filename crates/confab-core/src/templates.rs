//! Fixed user-facing strings shared across the application.

use crate::persona::Persona;

/// Title given to a session before a persona has been chosen.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Well-known id of the greeting message a persona opens with.
///
/// The greeting is regenerated every time a persona is selected, so it uses
/// a fixed id instead of a random one.
pub const WELCOME_MESSAGE_ID: &str = "1";

/// Shown in place of a reply when the response backend fails.
pub const STREAM_FAILURE_TEXT: &str =
    "I apologize, but I'm having trouble responding right now. Please try again in a moment.";

/// Greeting a persona sends when first selected.
pub fn welcome_text(persona: &Persona) -> String {
    format!(
        "Hello! I'm {}. {} How can I help you today?",
        persona.name, persona.description
    )
}

/// Session title once a persona has been chosen.
pub fn session_title(persona_name: &str) -> String {
    format!("Chat with {}", persona_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> Persona {
        Persona {
            id: "p-1".to_string(),
            name: "Ada Lovelace".to_string(),
            description: "Pioneer of computing.".to_string(),
            avatar: String::new(),
            category: "Historical Figure".to_string(),
        }
    }

    #[test]
    fn test_welcome_text_mentions_persona() {
        let text = welcome_text(&persona());
        assert_eq!(
            text,
            "Hello! I'm Ada Lovelace. Pioneer of computing. How can I help you today?"
        );
    }

    #[test]
    fn test_session_title() {
        assert_eq!(session_title("Ada Lovelace"), "Chat with Ada Lovelace");
    }
}
