//! `SimEmbeddingProvider` - Deterministic Simulation Embeddings
//!
//! `TigerStyle`: Primary implementation for tests and development.
//!
//! Vectors are unit-norm and hash-seeded: identical text always embeds to
//! the identical vector (self-similarity 1.0), unrelated texts land nearly
//! orthogonal. That is enough structure to exercise ranking end to end
//! without a model.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;

use super::{EmbeddingError, EmbeddingProvider};
use crate::constants::{EMBEDDING_BATCH_SIZE_MAX, EMBEDDING_DIMENSIONS_COUNT};
use crate::dst::{DeterministicRng, FaultInjector, FaultType};

/// Deterministic embedding provider.
#[derive(Debug, Clone)]
pub struct SimEmbeddingProvider {
    seed: u64,
    dimensions: usize,
    faults: Option<Arc<FaultInjector>>,
}

impl SimEmbeddingProvider {
    /// Create a provider with the given seed and default dimensionality.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            dimensions: EMBEDDING_DIMENSIONS_COUNT,
            faults: None,
        }
    }

    /// Create a provider with fault injection.
    #[must_use]
    pub fn with_faults(seed: u64, faults: Arc<FaultInjector>) -> Self {
        Self {
            seed,
            dimensions: EMBEDDING_DIMENSIONS_COUNT,
            faults: Some(faults),
        }
    }

    /// Override the vector dimensionality (smaller is faster in tests).
    ///
    /// # Panics
    /// Panics if dimensions is zero.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        // Precondition
        assert!(dimensions > 0, "dimensions must be positive");
        self.dimensions = dimensions;
        self
    }

    /// The seed in use.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn check_fault(&self) -> Result<(), EmbeddingError> {
        let Some(faults) = &self.faults else {
            return Ok(());
        };
        match faults.should_inject("embed") {
            Some(FaultType::EmbeddingTimeout) => Err(EmbeddingError::Timeout),
            Some(FaultType::EmbeddingInvalidResponse) => {
                Err(EmbeddingError::invalid_response("simulated garbled embedding"))
            }
            Some(other) => Err(EmbeddingError::network(other.as_str())),
            None => Ok(()),
        }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        text.hash(&mut hasher);
        let mut rng = DeterministicRng::new(hasher.finish());

        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|_| (rng.next_float() * 2.0 - 1.0) as f32)
            .collect();

        // Normalize to unit length. The all-zero draw is not reachable from
        // a uniform source, but guard anyway.
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        } else {
            vector[0] = 1.0;
        }

        // Postcondition
        assert_eq!(vector.len(), self.dimensions, "vector must have configured dimensions");
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for SimEmbeddingProvider {
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.check_fault()?;
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.len() > EMBEDDING_BATCH_SIZE_MAX {
            return Err(EmbeddingError::batch_too_large(
                texts.len(),
                EMBEDDING_BATCH_SIZE_MAX,
            ));
        }
        self.check_fault()?;
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "sim"
    }
}

// =============================================================================
// Tests
// =============================================================================
