//! Prompt Templates
//!
//! Templates for memory extraction and rolling-summary maintenance.
//! The sim provider routes on the leading phrases, so changing them
//! requires updating the sim as well.

/// Extraction prompt: transcript in, JSON candidate array out.
pub const MEMORY_EXTRACTION_PROMPT: &str = r#"Extract long-term memories from this conversation.

A memory is a durable fact, preference, goal, episode, or relationship about the user that would still matter in a future conversation. Ignore small talk, transient context, and anything the assistant said about itself.

Respond with a JSON array only. Each element:
{"content": "<one self-contained sentence>", "type": "fact|preference|goal|episode|relationship", "importance": <0.0-1.0>}

Return [] if the conversation contains nothing worth remembering.

Conversation:
{transcript}"#;

/// Summary-merge prompt: fold evicted buffer content into the rolling summary.
pub const SUMMARY_MERGE_PROMPT: &str = r#"Merge the following into one concise conversation summary. Preserve concrete details (names, dates, decisions) and drop pleasantries. Respond with the summary text only.

Existing summary:
{summary}

New content:
{content}"#;

/// Render the extraction prompt for a transcript.
#[must_use]
pub fn extraction_prompt(transcript: &str) -> String {
    MEMORY_EXTRACTION_PROMPT.replace("{transcript}", transcript)
}

/// Render the summary-merge prompt.
#[must_use]
pub fn summary_merge_prompt(summary: &str, content: &str) -> String {
    let summary = if summary.is_empty() { "(none)" } else { summary };
    SUMMARY_MERGE_PROMPT
        .replace("{summary}", summary)
        .replace("{content}", content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_transcript() {
        let prompt = extraction_prompt("user: I live in Tokyo");
        assert!(prompt.contains("user: I live in Tokyo"));
        assert!(!prompt.contains("{transcript}"));
        assert!(prompt.starts_with("Extract long-term memories"));
    }

    #[test]
    fn test_summary_merge_prompt() {
        let prompt = summary_merge_prompt("old summary", "user: new stuff");
        assert!(prompt.contains("old summary"));
        assert!(prompt.contains("user: new stuff"));
        assert!(prompt.starts_with("Merge the following"));
    }

    #[test]
    fn test_summary_merge_empty_summary_placeholder() {
        let prompt = summary_merge_prompt("", "content");
        assert!(prompt.contains("(none)"));
    }
}
