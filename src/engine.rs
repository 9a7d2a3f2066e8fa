//! `MemoryEngine` - Two-Tier Memory Facade
//!
//! The engine wires the extraction coordinator, the recall engine, the
//! embedding provider, and the two stores behind one handle. Conversation
//! ingestion is fire-and-forget; recall degrades to empty results when the
//! embedding provider is down, because a conversation without memories is
//! better than a conversation that errors.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::buffer::context_window_for;
use crate::constants::RECALL_QUERY_BYTES_MAX;
use crate::config::MemoryConfig;
use crate::decay::DecayCalculator;
use crate::embedding::{EmbeddingError, EmbeddingProvider, SimEmbeddingProvider};
use crate::extraction::{DefaultMemoryExtractor, ExtractionCoordinator, MemoryExtractor};
use crate::llm::SimLLMProvider;
use crate::message::{count_tokens, Message};
use crate::namespace::Namespace;
use crate::recall::{RecallEngine, ScoredMemory};
use crate::storage::{
    InMemoryMetadataStore, InMemoryVectorStore, MemoryRecord, MemoryType, MetadataStore,
    SearchFilter, StorageError, VectorStore,
};

// =============================================================================
// MemoryError
// =============================================================================

/// Errors surfaced by the engine's direct operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A store operation failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Embedding the content failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Outcome of a decay sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records whose decay factor was refreshed in place
    pub updated: usize,
    /// Records deleted for falling below the sweep threshold
    pub deleted: usize,
}

// =============================================================================
// MemoryEngine
// =============================================================================

/// Two-tier conversational memory engine.
///
/// # Example
///
/// ```rust
/// use engram::{MemoryEngine, MemoryType, Namespace};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let engine = MemoryEngine::sim(42);
/// let ns = Namespace::for_user("alice");
///
/// engine
///     .remember(&ns, "Allergic to peanuts", MemoryType::Fact, None)
///     .await
///     .unwrap();
/// let results = engine.recall(&ns, "what food allergies?", 3).await.unwrap();
/// assert_eq!(results.len(), 1);
/// # }
/// ```
pub struct MemoryEngine<X, E> {
    coordinator: ExtractionCoordinator<X, E>,
    recall: RecallEngine,
    embedder: Arc<E>,
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorStore>,
    decay: DecayCalculator,
    config: MemoryConfig,
}

/// Fully simulated engine for tests and deterministic simulation runs.
pub type SimMemoryEngine = MemoryEngine<DefaultMemoryExtractor<SimLLMProvider>, SimEmbeddingProvider>;

impl SimMemoryEngine {
    /// In-memory engine with deterministic sim providers.
    ///
    /// The same seed always produces the same extractions and embeddings.
    #[must_use]
    pub fn sim(seed: u64) -> Self {
        Self::new(
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(InMemoryVectorStore::new()),
            DefaultMemoryExtractor::new(SimLLMProvider::with_seed(seed)),
            SimEmbeddingProvider::with_seed(seed),
            MemoryConfig::default().with_async_extraction(false),
        )
    }
}

impl<X, E> MemoryEngine<X, E>
where
    X: MemoryExtractor + 'static,
    E: EmbeddingProvider + 'static,
{
    /// Assemble an engine from its components.
    #[must_use]
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorStore>,
        extractor: X,
        embedder: E,
        config: MemoryConfig,
    ) -> Self {
        let embedder = Arc::new(embedder);
        let decay = DecayCalculator::new();
        let coordinator = ExtractionCoordinator::new(
            Arc::new(extractor),
            Arc::clone(&embedder),
            Arc::clone(&metadata),
            Arc::clone(&vectors),
            config.clone(),
        );
        let recall = RecallEngine::new(
            Arc::clone(&metadata),
            Arc::clone(&vectors),
            decay.clone(),
            config.enable_decay,
        );
        Self {
            coordinator,
            recall,
            embedder,
            metadata,
            vectors,
            decay,
            config,
        }
    }

    /// Replace the decay rate table. Applies to recall and sweeps alike.
    #[must_use]
    pub fn with_decay_rates(mut self, rates: crate::decay::DecayRates) -> Self {
        self.decay = DecayCalculator::with_rates(rates);
        self.recall = RecallEngine::new(
            Arc::clone(&self.metadata),
            Arc::clone(&self.vectors),
            self.decay.clone(),
            self.config.enable_decay,
        );
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Conversation ingestion
    // -------------------------------------------------------------------------

    /// Open a session explicitly. Optional: `on_message` opens sessions on
    /// first use.
    pub fn start_session(&self, namespace: &Namespace, session_id: &str) {
        self.coordinator.start_session(namespace, session_id);
    }

    /// Record a conversation message. Never fails: extraction problems are
    /// logged and retried on a later trigger.
    pub async fn on_message(&self, namespace: &Namespace, session_id: &str, message: &Message) {
        self.coordinator.on_message(namespace, session_id, message).await;
    }

    /// Force extraction of everything buffered for the session.
    pub async fn flush(&self, namespace: &Namespace, session_id: &str) {
        self.coordinator.flush(namespace, session_id).await;
    }

    /// End a session, running the final extraction pass when configured.
    pub async fn end_session(&self, namespace: &Namespace, session_id: &str) {
        self.coordinator.end_session(namespace, session_id).await;
    }

    /// Whether a background extraction is in flight for the session.
    pub async fn is_extracting(&self, namespace: &Namespace, session_id: &str) -> bool {
        self.coordinator.is_extracting(namespace, session_id).await
    }

    // -------------------------------------------------------------------------
    // Direct memory operations
    // -------------------------------------------------------------------------

    /// Store a memory directly, bypassing extraction.
    ///
    /// # Panics
    /// Panics if `content` is blank or `importance` is outside [0, 1].
    pub async fn remember(
        &self,
        namespace: &Namespace,
        content: impl Into<String>,
        memory_type: MemoryType,
        importance: Option<f64>,
    ) -> Result<MemoryRecord, MemoryError> {
        let content = content.into();
        assert!(!content.trim().is_empty(), "memory content cannot be blank");

        let mut builder = MemoryRecord::builder(namespace.clone(), content, memory_type);
        if let Some(importance) = importance {
            builder = builder.importance(importance);
        }
        let record = builder.build();

        let embedding = self.embedder.embed(&record.content).await?;
        self.metadata.save(&record).await?;
        self.vectors.save(&record.id, &embedding).await?;

        debug!(namespace = %namespace, id = %record.id, "memory stored");
        Ok(record)
    }

    /// Delete a memory and its embedding. Returns whether it existed.
    pub async fn forget(&self, id: &str) -> Result<bool, MemoryError> {
        let existed = self.metadata.delete(id).await?;
        self.vectors.delete(id).await?;
        Ok(existed)
    }

    // -------------------------------------------------------------------------
    // Recall
    // -------------------------------------------------------------------------

    /// Recall up to `top_k` memories relevant to a natural-language query.
    ///
    /// Degrades gracefully: when the query cannot be embedded, logs a
    /// warning and returns no memories instead of failing the caller.
    pub async fn recall(
        &self,
        namespace: &Namespace,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredMemory>, MemoryError> {
        self.recall_with_filter(namespace, query, top_k, None).await
    }

    /// [`recall`](Self::recall) with a metadata filter pushed down to the store.
    ///
    /// # Panics
    /// Panics if `top_k` is zero or the query is blank or oversized.
    pub async fn recall_with_filter(
        &self,
        namespace: &Namespace,
        query: &str,
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredMemory>, MemoryError> {
        // Preconditions
        assert!(top_k > 0, "top_k must be positive");
        assert!(!query.trim().is_empty(), "query cannot be blank");
        assert!(
            query.len() <= RECALL_QUERY_BYTES_MAX,
            "query must be <= {RECALL_QUERY_BYTES_MAX} bytes"
        );

        let query_embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(error) => {
                warn!(namespace = %namespace, %error, "query embedding failed, recall degraded to empty");
                return Ok(Vec::new());
            }
        };

        let results = self
            .recall
            .recall(namespace, &query_embedding, top_k, filter)
            .await?;
        Ok(results)
    }

    /// Format recalled memories as a context block for a system prompt.
    ///
    /// The block is budgeted to `memory_budget_ratio` of the model's
    /// context window and at most `max_recall_records` entries; memories
    /// beyond the budget are dropped in score order. Empty input yields an
    /// empty string.
    #[must_use]
    pub fn format_as_context(&self, memories: &[ScoredMemory], model: &str) -> String {
        if memories.is_empty() {
            return String::new();
        }

        let budget_tokens =
            (context_window_for(model) as f64 * self.config.memory_budget_ratio) as usize;

        let mut block = String::from("[User Memory]\n");
        let mut used_tokens = count_tokens(&block);
        let mut included = 0;

        for memory in memories.iter().take(self.config.max_recall_records) {
            let line = format!(
                "- [{}] {}\n",
                memory.record.memory_type.as_str().to_uppercase(),
                memory.record.content
            );
            let line_tokens = count_tokens(&line);
            if included > 0 && used_tokens + line_tokens > budget_tokens {
                break;
            }
            block.push_str(&line);
            used_tokens += line_tokens;
            included += 1;
        }

        if included == 0 {
            return String::new();
        }
        block
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Recompute decay for every record in the namespace, deleting records
    /// below the sweep threshold and persisting fresh factors for the rest.
    ///
    /// No-op when decay is disabled.
    pub async fn run_decay_sweep(&self, namespace: &Namespace) -> Result<SweepReport, MemoryError> {
        if !self.config.enable_decay {
            return Ok(SweepReport::default());
        }

        let records = self.metadata.find_by_namespace(namespace).await?;
        let mut surviving_ids = Vec::new();
        let mut surviving_factors = Vec::new();
        let mut deleted = 0;

        for record in &records {
            let fresh = self.decay.calculate(record);
            if fresh < self.config.decay_sweep_threshold {
                self.metadata.delete(&record.id).await?;
                self.vectors.delete(&record.id).await?;
                deleted += 1;
            } else {
                surviving_ids.push(record.id.clone());
                surviving_factors.push(fresh);
            }
        }

        if !surviving_ids.is_empty() {
            self.metadata
                .update_decay_factors(&surviving_ids, &surviving_factors)
                .await?;
        }

        let report = SweepReport {
            updated: surviving_ids.len(),
            deleted,
        };
        debug!(
            namespace = %namespace,
            updated = report.updated,
            deleted = report.deleted,
            "decay sweep complete"
        );
        Ok(report)
    }

    /// Number of memories in the namespace.
    pub async fn count(&self, namespace: &Namespace) -> Result<usize, MemoryError> {
        Ok(self.metadata.count(namespace).await?)
    }

    /// Whether the namespace holds any memories.
    pub async fn has_memories(&self, namespace: &Namespace) -> Result<bool, MemoryError> {
        Ok(self.count(namespace).await? > 0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_remember_then_recall() {
        let engine = MemoryEngine::sim(42);
        let ns = Namespace::for_user("alice");

        let record = engine
            .remember(&ns, "Prefers window seats", MemoryType::Preference, Some(0.9))
            .await
            .unwrap();
        assert_eq!(record.importance, 0.9);

        let results = engine.recall(&ns, "Prefers window seats", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.id, record.id);
    }

    #[tokio::test]
    async fn test_forget_cascades() {
        let engine = MemoryEngine::sim(42);
        let ns = Namespace::for_user("alice");

        let record = engine
            .remember(&ns, "temporary note", MemoryType::Fact, None)
            .await
            .unwrap();
        assert!(engine.forget(&record.id).await.unwrap());
        assert!(!engine.forget(&record.id).await.unwrap());
        assert!(!engine.has_memories(&ns).await.unwrap());

        let results = engine.recall(&ns, "temporary note", 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_recall_degrades_on_embedding_fault() {
        use crate::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};

        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::EmbeddingTimeout, 1.0));
        let engine = MemoryEngine::new(
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(InMemoryVectorStore::new()),
            DefaultMemoryExtractor::new(SimLLMProvider::with_seed(42)),
            SimEmbeddingProvider::with_faults(42, Arc::new(injector)),
            MemoryConfig::default().with_async_extraction(false),
        );

        let results = engine
            .recall(&Namespace::for_user("alice"), "anything", 3)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    #[should_panic(expected = "query must be <=")]
    async fn test_oversized_query_rejected() {
        let engine = MemoryEngine::sim(42);
        let query = "q".repeat(RECALL_QUERY_BYTES_MAX + 1);
        let _ = engine.recall(&Namespace::for_user("alice"), &query, 3).await;
    }

    #[tokio::test]
    async fn test_format_as_context() {
        let engine = MemoryEngine::sim(42);
        let ns = Namespace::for_user("alice");

        engine
            .remember(&ns, "Allergic to peanuts", MemoryType::Fact, None)
            .await
            .unwrap();
        let results = engine.recall(&ns, "allergies", 3).await.unwrap();

        let block = engine.format_as_context(&results, "gpt-4o");
        assert!(block.starts_with("[User Memory]\n"));
        assert!(block.contains("- [FACT] Allergic to peanuts"));
    }

    #[tokio::test]
    async fn test_format_as_context_empty() {
        let engine = MemoryEngine::sim(42);
        assert_eq!(engine.format_as_context(&[], "gpt-4o"), "");
    }

    #[tokio::test]
    async fn test_format_as_context_caps_records() {
        let engine = MemoryEngine::new(
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(InMemoryVectorStore::new()),
            DefaultMemoryExtractor::new(SimLLMProvider::with_seed(42)),
            SimEmbeddingProvider::with_seed(42),
            MemoryConfig::default()
                .with_async_extraction(false)
                .with_max_recall_records(2),
        );
        let ns = Namespace::for_user("alice");

        for i in 0..5 {
            engine
                .remember(&ns, format!("fact number {i}"), MemoryType::Fact, None)
                .await
                .unwrap();
        }
        let results = engine.recall(&ns, "fact number", 5).await.unwrap();
        assert_eq!(results.len(), 5);

        let block = engine.format_as_context(&results, "gpt-4o");
        assert_eq!(block.matches("- [").count(), 2);
    }

    #[tokio::test]
    async fn test_decay_sweep_deletes_and_updates() {
        let engine = MemoryEngine::sim(42);
        let ns = Namespace::for_user("alice");

        // Fresh record survives; a year-old episode is swept.
        engine
            .remember(&ns, "recent fact", MemoryType::Fact, None)
            .await
            .unwrap();
        let stale = MemoryRecord::builder(ns.clone(), "ancient episode", MemoryType::Episode)
            .last_accessed_at(Some(Utc::now() - Duration::days(365)))
            .build();
        engine.metadata.save(&stale).await.unwrap();
        let embedding = engine.embedder.embed(&stale.content).await.unwrap();
        engine.vectors.save(&stale.id, &embedding).await.unwrap();

        let report = engine.run_decay_sweep(&ns).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(engine.count(&ns).await.unwrap(), 1);
        assert!(engine.metadata.find_by_id(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decay_sweep_disabled_is_noop() {
        let engine = MemoryEngine::new(
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(InMemoryVectorStore::new()),
            DefaultMemoryExtractor::new(SimLLMProvider::with_seed(42)),
            SimEmbeddingProvider::with_seed(42),
            MemoryConfig::default()
                .with_async_extraction(false)
                .with_enable_decay(false),
        );
        let ns = Namespace::for_user("alice");

        let stale = MemoryRecord::builder(ns.clone(), "ancient episode", MemoryType::Episode)
            .last_accessed_at(Some(Utc::now() - Duration::days(365)))
            .build();
        engine.metadata.save(&stale).await.unwrap();

        let report = engine.run_decay_sweep(&ns).await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert_eq!(engine.count(&ns).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_conversation_to_recall_pipeline() {
        let engine = MemoryEngine::sim(42);
        let ns = Namespace::for_user("alice");

        engine
            .on_message(&ns, "s-1", &Message::user("I live in Tokyo"))
            .await;
        engine
            .on_message(&ns, "s-1", &Message::assistant("Great city!"))
            .await;
        engine.end_session(&ns, "s-1").await;

        assert!(engine.has_memories(&ns).await.unwrap());
        let results = engine.recall(&ns, "I live in Tokyo", 3).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].record.content, "I live in Tokyo");
    }

    #[tokio::test]
    async fn test_namespace_isolation_via_facade() {
        let engine = MemoryEngine::sim(42);
        let alice = Namespace::for_user("alice");
        let bob = Namespace::for_user("bob");

        engine
            .remember(&bob, "bob's secret", MemoryType::Fact, None)
            .await
            .unwrap();
        let results = engine.recall(&alice, "bob's secret", 3).await.unwrap();
        assert!(results.is_empty());
    }
}
