//! Short-Term Buffer - Bounded Conversation Window
//!
//! `TigerStyle`: The bound is an invariant, not a goal. After every insert
//! the buffer holds at most `max_messages` messages and `max_tokens` tokens
//! (a single oversized message is kept rather than leaving the buffer empty).
//!
//! Evicted non-system content accumulates until it is folded into the
//! rolling summary by an LLM call. System messages are dropped on eviction
//! without being remembered.

use std::borrow::Cow;
use std::collections::VecDeque;

use crate::constants::{
    BUFFER_CONTEXT_WINDOW_RATIO_DEFAULT, BUFFER_MESSAGES_COUNT_DEFAULT,
    BUFFER_TOKENS_COUNT_DEFAULT, MODEL_CONTEXT_TOKENS_FALLBACK,
};
use crate::extraction::prompts;
use crate::llm::{CompletionRequest, LLMProvider, ProviderError};
use crate::message::{count_message_tokens, Message, Role};

// =============================================================================
// Model Context Lookup
// =============================================================================

/// Context window sizes for known model families, longest prefix first.
const MODEL_CONTEXT_TOKENS: &[(&str, usize)] = &[
    ("gpt-4o", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo", 16_385),
    ("claude", 200_000),
    ("gemini-1.5", 1_000_000),
];

/// Context window for a model name, by prefix match with a conservative
/// fallback for unknown models.
#[must_use]
pub fn context_window_for(model: &str) -> usize {
    MODEL_CONTEXT_TOKENS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map_or(MODEL_CONTEXT_TOKENS_FALLBACK, |(_, tokens)| *tokens)
}

// =============================================================================
// ShortTermBufferConfig
// =============================================================================

/// Bounds for a [`ShortTermBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortTermBufferConfig {
    /// Maximum messages held
    pub max_messages: usize,
    /// Maximum total tokens held
    pub max_tokens: usize,
}

impl Default for ShortTermBufferConfig {
    fn default() -> Self {
        Self {
            max_messages: BUFFER_MESSAGES_COUNT_DEFAULT,
            max_tokens: BUFFER_TOKENS_COUNT_DEFAULT,
        }
    }
}

impl ShortTermBufferConfig {
    /// Explicit bounds.
    ///
    /// # Panics
    /// Panics if either bound is zero.
    #[must_use]
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        // Preconditions
        assert!(max_messages > 0, "max_messages must be positive");
        assert!(max_tokens > 0, "max_tokens must be positive");

        Self {
            max_messages,
            max_tokens,
        }
    }

    /// Model-aware bounds: 80% of the model's context window in tokens,
    /// default message cap.
    #[must_use]
    pub fn for_model(model: &str) -> Self {
        let max_tokens =
            (context_window_for(model) as f64 * BUFFER_CONTEXT_WINDOW_RATIO_DEFAULT) as usize;
        Self {
            max_messages: BUFFER_MESSAGES_COUNT_DEFAULT,
            max_tokens: max_tokens.max(1),
        }
    }
}

// =============================================================================
// ShortTermBuffer
// =============================================================================

/// Bounded FIFO window over the live conversation.
///
/// # Example
///
/// ```rust
/// use engram::buffer::{ShortTermBuffer, ShortTermBufferConfig};
/// use engram::Message;
///
/// let mut buffer = ShortTermBuffer::new(ShortTermBufferConfig::new(3, 10_000));
/// for content in ["A", "B", "C", "D"] {
///     buffer.add(Message::user(content));
/// }
/// assert_eq!(buffer.len(), 3);
/// assert!(buffer.pending_eviction().contains("A"));
/// ```
#[derive(Debug)]
pub struct ShortTermBuffer {
    config: ShortTermBufferConfig,
    messages: VecDeque<Message>,
    token_count: usize,
    rolling_summary: String,
    /// Evicted content awaiting a summary merge
    pending_eviction: String,
}

impl ShortTermBuffer {
    /// Create an empty buffer with the given bounds.
    #[must_use]
    pub fn new(config: ShortTermBufferConfig) -> Self {
        Self {
            config,
            messages: VecDeque::new(),
            token_count: 0,
            rolling_summary: String::new(),
            pending_eviction: String::new(),
        }
    }

    /// The bounds in use.
    #[must_use]
    pub fn config(&self) -> &ShortTermBufferConfig {
        &self.config
    }

    /// Append a message, evicting oldest-first until the bounds hold again.
    pub fn add(&mut self, message: Message) {
        self.token_count += message.token_count();
        self.messages.push_back(message);
        self.evict_to_bounds();

        // Postcondition: bounds hold unless a single message exceeds them
        assert!(
            self.messages.len() <= self.config.max_messages || self.messages.len() == 1,
            "message bound must hold after add"
        );
    }

    /// Append several messages in order.
    pub fn add_all(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.add(message);
        }
    }

    fn evict_to_bounds(&mut self) {
        while self.messages.len() > 1
            && (self.messages.len() > self.config.max_messages
                || self.token_count > self.config.max_tokens)
        {
            if let Some(evicted) = self.messages.pop_front() {
                self.token_count = self.token_count.saturating_sub(evicted.token_count());
                self.accumulate_eviction(&evicted);
            }
        }
    }

    fn accumulate_eviction(&mut self, message: &Message) {
        // System messages are never merged into the summary.
        if message.role == Role::System {
            return;
        }
        self.pending_eviction
            .push_str(&format!("{}: {}\n", message.role, message.content));
    }

    /// Messages currently held, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// The most recent `n` messages, oldest first.
    #[must_use]
    pub fn recent_messages(&self, n: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// The most recent user message together with the first assistant
    /// message that answers it. The pair need not be adjacent (tool
    /// messages may sit between them).
    #[must_use]
    pub fn latest_exchange(&self) -> Option<(Message, Message)> {
        let user_index = self.messages.iter().rposition(|m| m.role == Role::User)?;
        let assistant = self
            .messages
            .iter()
            .skip(user_index + 1)
            .find(|m| m.role == Role::Assistant)?;
        Some((self.messages[user_index].clone(), assistant.clone()))
    }

    /// Number of messages held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Total tokens held.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// The rolling summary of everything evicted and merged so far.
    #[must_use]
    pub fn rolling_summary(&self) -> &str {
        &self.rolling_summary
    }

    /// Seed or replace the rolling summary (session restore).
    pub fn set_rolling_summary(&mut self, summary: impl Into<String>) {
        self.rolling_summary = summary.into();
    }

    /// Evicted content not yet folded into the rolling summary.
    #[must_use]
    pub fn pending_eviction(&self) -> &str {
        &self.pending_eviction
    }

    /// Whether there is evicted content awaiting a merge.
    #[must_use]
    pub fn has_pending_eviction(&self) -> bool {
        !self.pending_eviction.is_empty()
    }

    /// Reduce an arbitrary message sequence to the token budget, evicting
    /// oldest non-system content into the pending accumulator.
    ///
    /// Returns `Cow::Borrowed` when the input is already within budget, so
    /// callers can detect the no-op without comparing sequences.
    pub fn compress<'a>(&mut self, messages: &'a [Message]) -> Cow<'a, [Message]> {
        if count_message_tokens(messages) <= self.config.max_tokens {
            return Cow::Borrowed(messages);
        }

        let mut kept: Vec<Message> = messages.to_vec();
        let mut tokens = count_message_tokens(&kept);

        while tokens > self.config.max_tokens {
            let Some(index) = kept.iter().position(|m| m.role != Role::System) else {
                break;
            };
            // Keep at least the newest non-system message.
            if kept.iter().filter(|m| m.role != Role::System).count() <= 1 {
                break;
            }
            let evicted = kept.remove(index);
            tokens = tokens.saturating_sub(evicted.token_count());
            self.accumulate_eviction(&evicted);
        }

        Cow::Owned(kept)
    }

    /// Fold the pending evicted content into the rolling summary via an
    /// LLM merge call. Returns whether a merge happened.
    ///
    /// On provider failure the pending content is kept for a later retry.
    pub async fn summarize_pending<P: LLMProvider>(
        &mut self,
        provider: &P,
    ) -> Result<bool, ProviderError> {
        if self.pending_eviction.is_empty() {
            return Ok(false);
        }

        let prompt = prompts::summary_merge_prompt(&self.rolling_summary, &self.pending_eviction);
        let response = provider.complete(&CompletionRequest::new(prompt)).await?;

        self.rolling_summary = response.trim().to_string();
        self.pending_eviction.clear();
        Ok(true)
    }

    /// Drop all messages, the rolling summary, and pending content.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.token_count = 0;
        self.rolling_summary.clear();
        self.pending_eviction.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
