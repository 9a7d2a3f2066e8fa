//! Vector Store - Embedding Persistence and Similarity Search
//!
//! `TigerStyle`: The trait is the contract; the in-memory impl is a
//! brute-force reference (exact cosine over every stored vector).
//!
//! Similarity is raw cosine in [-1, 1]. Zero-norm or length-mismatched
//! vectors score 0.0 rather than erroring, so one malformed embedding can
//! never poison a whole search.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::error::{StorageError, StorageResult};
use crate::dst::FaultInjector;

// =============================================================================
// Cosine Similarity
// =============================================================================

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Returns 0.0 for zero-norm or length-mismatched inputs.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());

    // Postcondition: floating error can nudge past the bound
    let clamped = similarity.clamp(-1.0, 1.0) as f32;
    assert!((-1.0..=1.0).contains(&clamped), "cosine must be in [-1, 1]");
    clamped
}

// =============================================================================
// VectorStore Trait
// =============================================================================

/// One similarity search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    /// Record id the embedding belongs to
    pub id: String,
    /// Cosine similarity to the query, in [-1, 1]
    pub similarity: f32,
}

/// Persistence contract for record embeddings.
///
/// Embeddings are keyed by record id; deleting a record must be paired with
/// deleting its embedding (the engine owns that cascade).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace one embedding.
    async fn save(&self, id: &str, embedding: &[f32]) -> StorageResult<()>;

    /// Insert or replace many embeddings; `ids` and `embeddings` correspond
    /// positionally.
    async fn save_all(&self, ids: &[String], embeddings: &[Vec<f32>]) -> StorageResult<()>;

    /// Delete one embedding. Returns whether it existed.
    async fn delete(&self, id: &str) -> StorageResult<bool>;

    /// Delete many embeddings. Unknown ids are ignored.
    async fn delete_all(&self, ids: &[String]) -> StorageResult<()>;

    /// Top `top_k` most similar embeddings to the query, best first.
    async fn search(&self, query: &[f32], top_k: usize) -> StorageResult<Vec<VectorMatch>>;

    /// Like [`Self::search`], restricted to the given candidate ids.
    async fn search_among(
        &self,
        query: &[f32],
        top_k: usize,
        candidate_ids: &[String],
    ) -> StorageResult<Vec<VectorMatch>>;

    /// Number of stored embeddings.
    async fn count(&self) -> StorageResult<usize>;
}

// =============================================================================
// InMemoryVectorStore
// =============================================================================

/// Brute-force in-process reference implementation.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    faults: Option<Arc<FaultInjector>>,
}

impl InMemoryVectorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with fault injection.
    #[must_use]
    pub fn with_faults(faults: Arc<FaultInjector>) -> Self {
        Self {
            vectors: RwLock::new(HashMap::new()),
            faults: Some(faults),
        }
    }

    fn check_fault(&self, operation: &str) -> StorageResult<()> {
        if let Some(faults) = &self.faults {
            if let Some(fault) = faults.should_inject(operation) {
                return Err(StorageError::simulated_fault(fault.as_str()));
            }
        }
        Ok(())
    }

    fn read_guard(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<f32>>>> {
        self.vectors
            .read()
            .map_err(|_| StorageError::internal("vector lock poisoned"))
    }

    fn write_guard(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<f32>>>> {
        self.vectors
            .write()
            .map_err(|_| StorageError::internal("vector lock poisoned"))
    }

    fn rank(pool: impl Iterator<Item = (String, f32)>, top_k: usize) -> Vec<VectorMatch> {
        let mut matches: Vec<VectorMatch> = pool
            .map(|(id, similarity)| VectorMatch { id, similarity })
            .collect();
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        matches
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn save(&self, id: &str, embedding: &[f32]) -> StorageResult<()> {
        // Precondition
        assert!(!embedding.is_empty(), "embedding cannot be empty");

        self.check_fault("vector_save")?;
        self.write_guard()?.insert(id.to_string(), embedding.to_vec());
        Ok(())
    }

    async fn save_all(&self, ids: &[String], embeddings: &[Vec<f32>]) -> StorageResult<()> {
        // Precondition
        assert_eq!(ids.len(), embeddings.len(), "ids and embeddings must correspond");

        self.check_fault("vector_save_all")?;
        let mut guard = self.write_guard()?;
        for (id, embedding) in ids.iter().zip(embeddings) {
            assert!(!embedding.is_empty(), "embedding cannot be empty");
            guard.insert(id.clone(), embedding.clone());
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> StorageResult<bool> {
        self.check_fault("vector_delete")?;
        Ok(self.write_guard()?.remove(id).is_some())
    }

    async fn delete_all(&self, ids: &[String]) -> StorageResult<()> {
        self.check_fault("vector_delete_all")?;
        let mut guard = self.write_guard()?;
        for id in ids {
            guard.remove(id);
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> StorageResult<Vec<VectorMatch>> {
        // Precondition
        assert!(top_k > 0, "top_k must be positive");

        self.check_fault("vector_search")?;
        let guard = self.read_guard()?;
        let pool = guard
            .iter()
            .map(|(id, v)| (id.clone(), cosine_similarity(query, v)));
        Ok(Self::rank(pool, top_k))
    }

    async fn search_among(
        &self,
        query: &[f32],
        top_k: usize,
        candidate_ids: &[String],
    ) -> StorageResult<Vec<VectorMatch>> {
        // Precondition
        assert!(top_k > 0, "top_k must be positive");

        self.check_fault("vector_search")?;
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }

        let guard = self.read_guard()?;
        let pool = candidate_ids.iter().filter_map(|id| {
            guard
                .get(id)
                .map(|v| (id.clone(), cosine_similarity(query, v)))
        });
        Ok(Self::rank(pool, top_k))
    }

    async fn count(&self) -> StorageResult<usize> {
        self.check_fault("vector_count")?;
        Ok(self.read_guard()?.len())
    }
}

// =============================================================================
// Tests
// =============================================================================
