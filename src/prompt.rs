//! Prompt text sent to the completion provider.

use crate::mood::normalize_locale;

/// System prompt for a chat turn. Search results, when present, are appended
/// as background the model may draw on.
pub fn chat_system_prompt(locale: &str, search_context: &str) -> String {
    let mut prompt = format!(
        "You are a friendly, concise AI companion. Reply in the user's language. Language: {}.\n\
         Earlier turns marked like \"[from N days ago]\" happened that long ago; \
         refer to them as past events.",
        normalize_locale(locale)
    );

    if !search_context.trim().is_empty() {
        prompt.push_str("\n\nWeb results that may help (cite nothing verbatim):\n");
        prompt.push_str(search_context.trim());
    }

    prompt
}

pub fn oracle_system_prompt() -> &'static str {
    "You are a gentle oracle. Write one short, uplifting message of at most two sentences \
     for everyone who visits today. Reply with the message only."
}

pub fn question_system_prompt() -> &'static str {
    "You write one light multiple-choice trivia or wellbeing question. Reply with JSON only: \
     {\"question\": string, \"choices\": [4 short strings], \"answer\": index of the correct choice}."
}

/// Reply shown when the completion provider fails.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble finding my words right now, but I'm still here. Could you try again in a moment?";
