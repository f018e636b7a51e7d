pub const CHAT_INSTRUCTION: &str = include_str!("../data/prompts/chat_instruction.txt");
pub const CHAT_SYSTEM: &str = include_str!("../data/prompts/chat_system.txt");
pub const SUMMARIZE: &str = include_str!("../data/prompts/summarize.txt");
pub const SUMMARIZE_DOCUMENT: &str = include_str!("../data/prompts/summarize_document.txt");
pub const IMPROVE_NOTE: &str = include_str!("../data/prompts/improve_note.txt");
pub const FLASHCARDS: &str = include_str!("../data/prompts/flashcards.txt");
pub const QUIZ: &str = include_str!("../data/prompts/quiz.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
