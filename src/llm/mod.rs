//! LLM Provider Abstraction
//!
//! `TigerStyle`: Sim-first. The deterministic [`SimLLMProvider`] is the
//! default for tests and development; production providers implement the
//! same trait.

mod sim;

use async_trait::async_trait;
use thiserror::Error;

pub use sim::SimLLMProvider;

use crate::constants::LLM_PROMPT_BYTES_MAX;

// =============================================================================
// CompletionRequest
// =============================================================================

/// A single completion request.
///
/// # Example
///
/// ```rust
/// use engram::llm::CompletionRequest;
///
/// let request = CompletionRequest::new("Summarize the conversation.")
///     .with_system("You are a concise summarizer.")
///     .with_max_tokens(256);
/// ```
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// User prompt
    pub prompt: String,
    /// Optional system prompt
    pub system: Option<String>,
    /// Optional completion token cap
    pub max_tokens: Option<u32>,
    /// Optional sampling temperature
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a request with the given prompt.
    ///
    /// # Panics
    /// Panics if the prompt is empty or oversized.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();

        // Preconditions
        assert!(!prompt.is_empty(), "prompt cannot be empty");
        assert!(
            prompt.len() <= LLM_PROMPT_BYTES_MAX,
            "prompt must be <= {LLM_PROMPT_BYTES_MAX} bytes"
        );

        Self {
            prompt,
            system: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Cap the completion length.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        // Precondition
        assert!(max_tokens > 0, "max_tokens must be positive");
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        // Precondition
        assert!(
            (0.0..=2.0).contains(&temperature),
            "temperature must be in [0, 2]"
        );
        self.temperature = Some(temperature);
        self
    }
}

// =============================================================================
// ProviderError
// =============================================================================

/// Errors from LLM providers.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Rate limit exceeded
    #[error("rate limited{}", retry_after_ms.map(|ms| format!(", retry after {ms}ms")).unwrap_or_default())]
    RateLimit {
        /// Suggested retry delay
        retry_after_ms: Option<u64>,
    },

    /// Response was not in the expected format
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// What was wrong with the response
        message: String,
    },

    /// Service unavailable
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        /// Description of the outage
        message: String,
    },

    /// Request was rejected as invalid
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Rejection reason
        message: String,
    },

    /// Network-level failure
    #[error("network error: {message}")]
    Network {
        /// Description of the failure
        message: String,
    },
}

impl ProviderError {
    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limit(retry_after_ms: Option<u64>) -> Self {
        Self::RateLimit { retry_after_ms }
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a service unavailable error.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimit { .. } | Self::ServiceUnavailable { .. } | Self::Network { .. }
        )
    }
}

// =============================================================================
// LLMProvider Trait
// =============================================================================

/// Text completion provider.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Complete the request, returning the raw response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Whether this is a simulation provider.
    fn is_simulation(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================
