//! `SimLLMProvider` - Deterministic Simulation LLM
//!
//! `TigerStyle`: Primary implementation for tests and development.
//! Same seed and prompt always produce the same response; faults are
//! injectable. No network, no latency.
//!
//! The sim routes on prompt shape: memory-extraction prompts get a JSON
//! array of candidates derived from the transcript's user lines, summary
//! prompts get a one-line synthetic summary, everything else gets a
//! generic acknowledgement.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{CompletionRequest, LLMProvider, ProviderError};
use crate::dst::{FaultInjector, FaultType};

/// Marker the extraction prompt template carries; the sim routes on it.
const EXTRACTION_MARKER: &str = "Extract long-term memories";

/// Marker the summary-merge prompt template carries.
const SUMMARY_MARKER: &str = "Merge the following";

/// Deterministic LLM provider.
///
/// # Example
///
/// ```rust
/// use engram::llm::{CompletionRequest, LLMProvider, SimLLMProvider};
///
/// #[tokio::main]
/// async fn main() {
///     let provider = SimLLMProvider::with_seed(42);
///     let request = CompletionRequest::new("Say hello.");
///     let a = provider.complete(&request).await.unwrap();
///     let b = SimLLMProvider::with_seed(42).complete(&request).await.unwrap();
///     assert_eq!(a, b);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SimLLMProvider {
    seed: u64,
    faults: Option<Arc<FaultInjector>>,
}

impl SimLLMProvider {
    /// Create a provider with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, faults: None }
    }

    /// Create a provider with fault injection.
    #[must_use]
    pub fn with_faults(seed: u64, faults: Arc<FaultInjector>) -> Self {
        Self {
            seed,
            faults: Some(faults),
        }
    }

    /// The seed in use.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn check_fault(&self) -> Result<(), ProviderError> {
        let Some(faults) = &self.faults else {
            return Ok(());
        };
        match faults.should_inject("llm_complete") {
            Some(FaultType::LlmTimeout) => Err(ProviderError::Timeout),
            Some(FaultType::LlmRateLimit) => Err(ProviderError::rate_limit(None)),
            Some(FaultType::LlmInvalidResponse) => {
                Err(ProviderError::invalid_response("simulated garbled response"))
            }
            Some(FaultType::LlmServiceUnavailable) => {
                Err(ProviderError::service_unavailable("simulated outage"))
            }
            Some(other) => Err(ProviderError::network(other.as_str())),
            None => Ok(()),
        }
    }

    fn hash(&self, text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        text.hash(&mut hasher);
        hasher.finish()
    }

    /// Emit a JSON candidate array: one memory per user line in the
    /// transcript, capped at three.
    fn extraction_response(&self, prompt: &str) -> String {
        const TYPES: [&str; 5] = ["fact", "preference", "goal", "episode", "relationship"];

        let candidates: Vec<serde_json::Value> = prompt
            .lines()
            .filter_map(|line| line.trim().strip_prefix("user: "))
            .filter(|content| !content.is_empty())
            .take(3)
            .map(|content| {
                let hash = self.hash(content);
                let memory_type = TYPES[(hash % TYPES.len() as u64) as usize];
                let importance = 0.5 + (hash % 50) as f64 / 100.0;
                json!({
                    "content": content,
                    "type": memory_type,
                    "importance": importance,
                })
            })
            .collect();

        serde_json::to_string(&candidates).unwrap_or_else(|_| "[]".to_string())
    }

    fn summary_response(&self, prompt: &str) -> String {
        format!("Conversation summary ({:016x}).", self.hash(prompt))
    }

    fn generic_response(&self, prompt: &str) -> String {
        format!("ok ({:016x})", self.hash(prompt))
    }
}

#[async_trait]
impl LLMProvider for SimLLMProvider {
    #[tracing::instrument(skip(self, request), fields(prompt_len = request.prompt.len()))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.check_fault()?;

        let full_prompt = match &request.system {
            Some(system) => format!("{system}\n\n{}", request.prompt),
            None => request.prompt.clone(),
        };

        if full_prompt.contains(EXTRACTION_MARKER) {
            Ok(self.extraction_response(&full_prompt))
        } else if full_prompt.contains(SUMMARY_MARKER) {
            Ok(self.summary_response(&full_prompt))
        } else {
            Ok(self.generic_response(&full_prompt))
        }
    }

    fn name(&self) -> &'static str {
        "sim"
    }

    fn is_simulation(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
