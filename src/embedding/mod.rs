//! Embedding Provider Abstraction
//!
//! `TigerStyle`: Sim-first. The deterministic [`SimEmbeddingProvider`] is
//! the default for tests and development.

mod sim;

use async_trait::async_trait;
use thiserror::Error;

pub use sim::SimEmbeddingProvider;

// =============================================================================
// EmbeddingError
// =============================================================================

/// Errors from embedding providers.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Request timed out
    #[error("embedding request timed out")]
    Timeout,

    /// Response was malformed
    #[error("invalid embedding response: {message}")]
    InvalidResponse {
        /// What was wrong with the response
        message: String,
    },

    /// Batch exceeds the provider limit
    #[error("batch too large: {size} > {limit}")]
    BatchTooLarge {
        /// Requested batch size
        size: usize,
        /// Provider limit
        limit: usize,
    },

    /// Network-level failure
    #[error("network error: {message}")]
    Network {
        /// Description of the failure
        message: String,
    },
}

impl EmbeddingError {
    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a batch too large error.
    #[must_use]
    pub fn batch_too_large(size: usize, limit: usize) -> Self {
        Self::BatchTooLarge { size, limit }
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
        matches!(self, Self::Timeout | Self::Network { .. })
    }
}

// =============================================================================
// EmbeddingProvider Trait
// =============================================================================

/// Text embedding provider.
///
/// Contract: `embed_batch` returns exactly one vector per input, in input
/// order, all with [`Self::dimensions`] components. Callers treat any count
/// mismatch as a failure of the whole batch.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed many texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Vector dimensionality this provider produces.
    fn dimensions(&self) -> usize;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
