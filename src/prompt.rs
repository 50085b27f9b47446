//! Prompt templates for document questions.

use crate::inference::ChatMessage;

const DETAILED_SYSTEM_PROMPT: &str =
    "You are an AI that provides detailed, comprehensive answers based on the uploaded document.";
const CONCISE_SYSTEM_PROMPT: &str =
    "You are an AI that provides concise, direct answers based on the uploaded document.";

const DETAILED_STYLE: &str =
    "Respond conversationally. Avoid bold text and use newlines where needed.";
const CONCISE_STYLE: &str =
    "Respond shortly and conversationally. Avoid bold text and use newlines where needed.";

/// System instruction for the requested answer depth.
pub fn system_prompt(detailed: bool) -> &'static str {
    if detailed {
        DETAILED_SYSTEM_PROMPT
    } else {
        CONCISE_SYSTEM_PROMPT
    }
}

/// User message embedding the document text and the question.
pub fn user_prompt(document: &str, query: &str, detailed: bool) -> String {
    let style = if detailed { DETAILED_STYLE } else { CONCISE_STYLE };
    format!("Document:\n{document}\n\nQuery: {query}\n{style}")
}

/// Ordered `[system, user]` conversation sent to the model.
pub fn build_messages(document: &str, query: &str, detailed: bool) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(detailed)),
        ChatMessage::user(user_prompt(document, query, detailed)),
    ]
}
