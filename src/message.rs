//! Message - Conversation Turns and Token Accounting
//!
//! `TigerStyle`: Token budgets are load-bearing, so counting uses the real
//! cl100k-base tokenizer rather than byte-length approximations.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

/// Shared cl100k-base encoder. Construction parses the embedded vocabulary,
/// so it is cached for the process lifetime.
static CL100K: LazyLock<CoreBPE> =
    LazyLock::new(|| tiktoken_rs::cl100k_base().expect("cl100k_base vocabulary must load"));

// =============================================================================
// Role
// =============================================================================

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions. Never evicted into summaries, never extracted.
    System,
    /// End-user input. Turn boundaries are counted by user messages.
    User,
    /// Model output.
    Assistant,
    /// Tool/function result.
    Tool,
}

impl Role {
    /// Transcript label for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Message
// =============================================================================

/// A tool invocation carried by an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool/function name
    pub name: String,
    /// Serialized argument payload
    pub arguments: String,
}

/// One conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message
    pub role: Role,
    /// Text content (may be empty for pure tool-call messages)
    pub content: String,
    /// Tool calls attached to the message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    /// Create a message with the given role and content.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool-result message.
    #[must_use]
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }

    /// Attach a tool call.
    #[must_use]
    pub fn with_tool_call(mut self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        self.tool_calls.push(ToolCall {
            name: name.into(),
            arguments: arguments.into(),
        });
        self
    }

    /// Token count of the message: content plus tool-call argument payloads.
    #[must_use]
    pub fn token_count(&self) -> usize {
        let mut total = count_tokens(&self.content);
        for call in &self.tool_calls {
            total += count_tokens(&call.arguments);
        }
        total
    }
}

// =============================================================================
// Token Accounting
// =============================================================================

/// Count cl100k-base tokens in a text.
#[must_use]
pub fn count_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    CL100K.encode_with_special_tokens(text).len()
}

/// Total token count of a message sequence.
#[must_use]
pub fn count_message_tokens(messages: &[Message]) -> usize {
    messages.iter().map(Message::token_count).sum()
}

/// Truncate a text to at most `max_tokens` tokens.
///
/// Returns the input unchanged when already within budget. Decoding a token
/// prefix can land inside a multi-byte codepoint, in which case the cut falls
/// back to the nearest valid boundary.
#[must_use]
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    // Precondition
    assert!(max_tokens > 0, "max_tokens must be positive");

    if count_tokens(text) <= max_tokens {
        return text.to_string();
    }

    let tokens = CL100K.encode_ordinary(text);
    let prefix = tokens[..max_tokens.min(tokens.len())].to_vec();
    match CL100K.decode(prefix) {
        Ok(decoded) => decoded,
        Err(_) => {
            // Token boundary split a codepoint; cut on chars instead.
            text.chars().take(max_tokens * 4).collect()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens_empty() {
        assert_eq!(count_tokens(""), 0);
    }

    #[test]
    fn test_count_tokens_nonzero() {
        let count = count_tokens("I prefer window seats on long flights.");
        assert!(count > 0);
        assert!(count < 20, "short sentence should be few tokens, got {count}");
    }

    #[test]
    fn test_message_token_count_includes_tool_args() {
        let plain = Message::assistant("checking the weather");
        let with_call = Message::assistant("checking the weather")
            .with_tool_call("get_weather", "{\"city\": \"Tokyo\", \"units\": \"metric\"}");

        assert!(with_call.token_count() > plain.token_count());
    }

    #[test]
    fn test_count_message_tokens_sums() {
        let messages = vec![Message::user("hello there"), Message::assistant("hi")];
        let total: usize = messages.iter().map(Message::token_count).sum();
        assert_eq!(count_message_tokens(&messages), total);
    }

    #[test]
    fn test_truncate_noop_under_budget() {
        let text = "short";
        assert_eq!(truncate_to_tokens(text, 100), text);
    }

    #[test]
    fn test_truncate_shortens() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(50);
        let truncated = truncate_to_tokens(&text, 10);
        assert!(count_tokens(&truncated) <= 10);
        assert!(text.starts_with(&truncated));
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::System, Role::User, Role::Assistant, Role::Tool] {
            let json = serde_json::to_string(&role).unwrap();
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }
    }

    #[test]
    fn test_message_serde_round_trip() {
        let msg = Message::user("I live in Tokyo").with_tool_call("noop", "{}");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    #[should_panic(expected = "max_tokens must be positive")]
    fn test_truncate_zero_budget() {
        let _ = truncate_to_tokens("text", 0);
    }
}
