//! Prompt templates for insight generation.

/// System prompt instructing the model to return strict JSON.
///
/// The verbatim-substring requirement is what makes downstream phrase
/// localization possible; a paraphrased highlight cannot be found on the page.
pub const INSIGHT_SYSTEM_PROMPT: &str = "You are a research analyst. Given a paragraph from a research document, \
you must return a JSON object with two fields:\n\
1. 'insight': A 2-3 sentence analysis of the paragraph's key finding or contribution.\n\
2. 'highlights': An array of 1-3 exact verbatim phrases from the paragraph that are most important.\n\
CRITICAL: The phrases in 'highlights' must be EXACT substrings of the input paragraph.\n\
Return ONLY valid JSON, no markdown, no extra text.";

/// Build the user message for one paragraph candidate.
pub fn paragraph_message(paragraph: &str) -> String {
    format!("Paragraph:\n{paragraph}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_carries_paragraph() {
        let msg = paragraph_message("We observe a 3x speedup.");
        assert!(msg.starts_with("Paragraph:\n"));
        assert!(msg.contains("3x speedup"));
    }

    #[test]
    fn system_prompt_demands_json() {
        assert!(INSIGHT_SYSTEM_PROMPT.contains("JSON"));
        assert!(INSIGHT_SYSTEM_PROMPT.contains("highlights"));
    }
}
