//! Prompt construction for chat responses and persona generation.

use confab_core::provider::HistoryEntry;
use confab_core::session::Sender;

/// How many prior turns are replayed to the model for context.
const HISTORY_WINDOW: usize = 5;

/// Content rules enforced on persona generation.
pub const CONTENT_GUIDELINES: &str = "\
CRITICAL CONTENT GUIDELINES - STRICTLY ENFORCE:
1. NEVER suggest generic roles/occupations as personas (e.g., \"Doctor\", \"Teacher\", \"Artist\", \"Engineer\").
2. ONLY suggest specific, named individuals - real people, fictional characters, historical figures, etc.
3. ABSOLUTELY NO adult content creators, pornographic actors, or sexually explicit personas.
4. ALLOW world-renowned, prominent figures even if they are controversial, but STRICTLY EXCLUDE those known primarily for severe criminal activity or hate speech.
5. NO objectifying or sexualized personas regardless of search term.
6. If the search term relates to inappropriate content, pivot to wholesome alternatives in the same general category.";

/// Category vocabulary the generation model picks from.
pub const PERSONA_CATEGORIES: &str = "\
[\"Historical Figure\", \"Contemporary Figure\", \"Celebrity\", \"Fictional Character\", \
\"Mythological Figure\", \"Literary Figure\", \"Scientist/Inventor\", \"Artist/Creator\", \
\"Philosopher\", \"Sports Personality\", \"Anime Character\", \"Video Game Character\", \
\"Superhero/Villain\", \"Pop Culture/Meme\", \"Tech Innovator\", \"Custom\"]";

/// System instruction that keeps the model in character for `persona`.
pub fn system_instruction(persona: &confab_core::persona::Persona) -> String {
    format!(
        "You are {name}, a {category} character. {description}\n\n\
         Please respond to the user's messages in character. Keep your responses engaging, \
         authentic to the character, and conversational. Stay true to the persona's personality \
         and background.\n\n\
         Key guidelines:\n\
         - Always respond as {name}\n\
         - Maintain consistency with your character's personality, background, and speaking style\n\
         - Keep responses natural and conversational\n\
         - Don't break character or mention that you're an AI\n\
         - Respond directly to what the user says without repeating their message",
        name = persona.name,
        category = persona.category,
        description = persona.description,
    )
}

/// The user-turn content: the recent history window followed by the new
/// message, rendered as `User:` / `Assistant:` lines.
pub fn chat_content(history: &[HistoryEntry], user_message: &str) -> String {
    let mut content = String::new();
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for entry in &history[start..] {
        let role = match entry.sender {
            Sender::User => "User",
            Sender::Persona => "Assistant",
        };
        content.push_str(role);
        content.push_str(": ");
        content.push_str(&entry.text);
        content.push('\n');
    }
    content.push_str("User: ");
    content.push_str(user_message);
    content
}

/// Prompt asking for a strict-JSON array of persona suggestions.
pub fn generate_personas_prompt(search_term: &str) -> String {
    format!(
        "You are generating personas for a family-friendly chat application. Generate up to 5 \
         appropriate personas related to or exactly named \"{search_term}\".\n\n\
         {CONTENT_GUIDELINES}\n\n\
         For each persona, provide:\n\
         - name: The full name of the specific person/character (NEVER just a role/occupation)\n\
         - description: A brief, family-friendly description (1-2 sentences) focusing on positive traits\n\
         - category: Choose from these categories: {PERSONA_CATEGORIES}\n\n\
         If the search term refers to inappropriate content or figures, suggest wholesome \
         alternatives instead.\n\n\
         Format your response as a JSON array of objects with these exact properties. Only return \
         the JSON array, no additional text."
    )
}
