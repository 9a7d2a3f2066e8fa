//! Recall - Effective-Score Ranked Retrieval
//!
//! Pipeline: resolve candidates in the namespace (filter pushed down),
//! over-fetch by similarity, recompute decay fresh, drop records below the
//! viability floor, rank by effective score, truncate, record accesses.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::constants::{RECALL_CANDIDATES_COUNT_MIN, RECALL_CANDIDATE_MULTIPLIER, RECALL_DECAY_FLOOR};
use crate::decay::DecayCalculator;
use crate::namespace::Namespace;
use crate::storage::{MemoryRecord, MetadataStore, SearchFilter, StorageResult, VectorStore};

// =============================================================================
// ScoredMemory
// =============================================================================

/// One recall result.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    /// The record, with its decay factor freshly recomputed
    pub record: MemoryRecord,
    /// Cosine similarity to the query, in [-1, 1]
    pub similarity: f64,
    /// Effective score used for ranking
    pub score: f64,
}

// =============================================================================
// RecallEngine
// =============================================================================

/// Ranks namespace-scoped memories against a query embedding.
pub struct RecallEngine {
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorStore>,
    decay: DecayCalculator,
    decay_enabled: bool,
}

impl RecallEngine {
    /// Create a recall engine over the given stores.
    #[must_use]
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorStore>,
        decay: DecayCalculator,
        decay_enabled: bool,
    ) -> Self {
        Self {
            metadata,
            vectors,
            decay,
            decay_enabled,
        }
    }

    /// Recall up to `top_k` memories for the query embedding.
    ///
    /// Records whose fresh decay factor falls below the viability floor are
    /// treated as already forgotten and never returned, even before a sweep
    /// deletes them. Returned records have their access recorded.
    pub async fn recall(
        &self,
        namespace: &Namespace,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> StorageResult<Vec<ScoredMemory>> {
        // Preconditions
        assert!(top_k > 0, "top_k must be positive");
        assert!(!query_embedding.is_empty(), "query embedding cannot be empty");

        let candidates = match filter {
            Some(filter) => {
                self.metadata
                    .find_by_namespace_with_filter(namespace, filter)
                    .await?
            }
            None => self.metadata.find_by_namespace(namespace).await?,
        };
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let by_id: HashMap<String, MemoryRecord> = candidates
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        let candidate_ids: Vec<String> = by_id.keys().cloned().collect();

        // Over-fetch so decay filtering and re-ranking have headroom.
        let fetch = (top_k * RECALL_CANDIDATE_MULTIPLIER).max(RECALL_CANDIDATES_COUNT_MIN);
        let matches = self
            .vectors
            .search_among(query_embedding, fetch, &candidate_ids)
            .await?;

        let mut scored: Vec<ScoredMemory> = Vec::with_capacity(matches.len());
        for hit in matches {
            let Some(record) = by_id.get(&hit.id) else {
                continue;
            };
            let mut record = record.clone();

            if self.decay_enabled {
                let fresh = self.decay.calculate(&record);
                if fresh < RECALL_DECAY_FLOOR {
                    continue;
                }
                record.decay_factor = fresh;
            }

            let similarity = f64::from(hit.similarity);
            let score = record.effective_score(similarity);
            scored.push(ScoredMemory {
                record,
                similarity,
                score,
            });
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let returned_ids: Vec<String> = scored.iter().map(|s| s.record.id.clone()).collect();
        if !returned_ids.is_empty() {
            self.metadata.record_access(&returned_ids).await?;
        }

        debug!(
            namespace = %namespace,
            returned = scored.len(),
            "recall complete"
        );
        Ok(scored)
    }
}

// =============================================================================
// Tests
// =============================================================================
