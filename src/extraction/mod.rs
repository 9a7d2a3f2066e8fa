//! Memory Extraction
//!
//! Turns conversation transcripts into long-term memory candidates.
//! [`DefaultMemoryExtractor`] prompts an [`LLMProvider`] and parses its
//! JSON leniently: a garbled response yields zero candidates rather than
//! an error, while provider failures surface so the chunk can be retried.

mod coordinator;
pub mod prompts;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub use coordinator::{ExtractionCoordinator, SessionPhase};

use crate::constants::EXTRACTION_CANDIDATES_COUNT_MAX;
use crate::embedding::EmbeddingError;
use crate::llm::{CompletionRequest, LLMProvider, ProviderError};
use crate::message::{Message, Role};
use crate::namespace::Namespace;
use crate::storage::{MemoryType, StorageError};

// =============================================================================
// ExtractionError
// =============================================================================

/// Errors from the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The LLM call failed
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Embedding the candidates failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The embedding batch did not match the candidate count
    #[error("embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingMismatch {
        /// Candidates sent
        expected: usize,
        /// Vectors received
        actual: usize,
    },

    /// Persisting the extracted records failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// MemoryCandidate
// =============================================================================

/// One extracted memory, prior to persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCandidate {
    /// Self-contained memory text
    pub content: String,
    /// Extractor-assigned type, if any
    pub memory_type: Option<MemoryType>,
    /// Extractor-assigned importance in [0, 1], if any
    pub importance: Option<f64>,
}

// =============================================================================
// MemoryExtractor Trait
// =============================================================================

/// Extracts memory candidates from a role-labeled transcript.
#[async_trait]
pub trait MemoryExtractor: Send + Sync {
    /// Extract candidates for the given namespace from the transcript.
    async fn extract(
        &self,
        namespace: &Namespace,
        transcript: &str,
    ) -> Result<Vec<MemoryCandidate>, ExtractionError>;
}

/// Render messages as a role-labeled transcript, excluding system messages.
#[must_use]
pub fn render_transcript(messages: &[Message]) -> String {
    let mut transcript = String::new();
    for message in messages {
        if message.role == Role::System {
            continue;
        }
        transcript.push_str(&format!("{}: {}\n", message.role, message.content));
    }
    transcript
}

// =============================================================================
// DefaultMemoryExtractor
// =============================================================================

/// Raw candidate as the model emits it: every field optional, unknown
/// fields ignored.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    content: Option<String>,
    #[serde(rename = "type")]
    memory_type: Option<String>,
    importance: Option<f64>,
}

/// LLM-backed extractor with lenient JSON parsing.
#[derive(Debug, Clone)]
pub struct DefaultMemoryExtractor<P: LLMProvider> {
    provider: P,
}

impl<P: LLMProvider> DefaultMemoryExtractor<P> {
    /// Create an extractor over the given provider.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The underlying provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Parse the model response into candidates.
    ///
    /// Code fences are stripped; anything that fails to parse yields an
    /// empty list. Blank candidates are dropped and importances clamped.
    fn parse_response(response: &str) -> Vec<MemoryCandidate> {
        let cleaned = strip_code_fences(response);
        let raw: Vec<RawCandidate> = match serde_json::from_str(cleaned) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "unparseable extraction response, treating as zero memories");
                return Vec::new();
            }
        };

        raw.into_iter()
            .filter_map(|candidate| {
                let content = candidate.content?.trim().to_string();
                if content.is_empty() {
                    return None;
                }
                Some(MemoryCandidate {
                    content,
                    memory_type: candidate.memory_type.as_deref().and_then(MemoryType::parse),
                    importance: candidate.importance.map(|i| i.clamp(0.0, 1.0)),
                })
            })
            .take(EXTRACTION_CANDIDATES_COUNT_MAX)
            .collect()
    }
}

/// Strip a leading/trailing Markdown code fence, if present.
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line.
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_start().strip_suffix("```").unwrap_or(inner).trim()
}

#[async_trait]
impl<P: LLMProvider> MemoryExtractor for DefaultMemoryExtractor<P> {
    #[tracing::instrument(skip(self, transcript), fields(namespace = %namespace, transcript_len = transcript.len()))]
    async fn extract(
        &self,
        namespace: &Namespace,
        transcript: &str,
    ) -> Result<Vec<MemoryCandidate>, ExtractionError> {
        if transcript.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = CompletionRequest::new(prompts::extraction_prompt(transcript));
        let response = self.provider.complete(&request).await?;
        Ok(Self::parse_response(&response))
    }
}

// =============================================================================
// Tests
// =============================================================================
