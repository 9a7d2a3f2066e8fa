//! Extraction Coordinator - Session Buffering and Batch Triggers
//!
//! `TigerStyle`: Extraction must never hurt the conversation. Failures are
//! logged and retried on a later trigger; nothing propagates to the caller
//! of `on_message`.
//!
//! Per `(namespace, session)` the coordinator keeps an ordered buffer of
//! unextracted messages and a high-water mark of user turns already
//! persisted. The buffer is drained per successfully persisted chunk, so a
//! failed chunk stays buffered and no turn is ever extracted twice.
//!
//! Concurrency: one async mutex per session key guards the state, a second
//! per-key mutex serializes extraction runs. Triggers that fire while a run
//! is in flight coalesce into it. Different keys never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use super::{render_transcript, ExtractionError, MemoryExtractor};
use crate::config::MemoryConfig;
use crate::constants::{EXTRACTION_TRUNCATION_MARKER, MEMORY_CONTENT_BYTES_MAX};
use crate::embedding::EmbeddingProvider;
use crate::message::{truncate_to_tokens, Message, Role};
use crate::namespace::Namespace;
use crate::storage::{MemoryRecord, MemoryType, MetadataStore, VectorStore};

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle phase of a session's extraction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No buffered messages
    Idle,
    /// Messages buffered, no extraction in flight
    Buffering,
    /// An extraction run is in flight
    Extracting,
}

#[derive(Debug)]
struct SessionState {
    namespace: Namespace,
    session_id: String,
    /// Unextracted messages, in arrival order
    buffer: Vec<Message>,
    buffered_tokens: usize,
    /// User turns covered by successfully persisted chunks
    extracted_turns: u64,
    phase: SessionPhase,
}

#[derive(Clone)]
struct SessionEntry {
    state: Arc<AsyncMutex<SessionState>>,
    /// Serializes extraction runs for this key
    extract_lock: Arc<AsyncMutex<()>>,
}

type SessionKey = (String, String);

// =============================================================================
// ExtractionCoordinator
// =============================================================================

/// Buffers conversation turns per session and extracts them in bounded
/// chunks once a trigger fires.
///
/// Cheap to clone; clones share all session state.
pub struct ExtractionCoordinator<X, E> {
    inner: Arc<Inner<X, E>>,
}

impl<X, E> Clone for ExtractionCoordinator<X, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<X, E> {
    extractor: Arc<X>,
    embedder: Arc<E>,
    metadata: Arc<dyn MetadataStore>,
    vectors: Arc<dyn VectorStore>,
    config: MemoryConfig,
    sessions: StdMutex<HashMap<SessionKey, SessionEntry>>,
}

impl<X, E> ExtractionCoordinator<X, E>
where
    X: MemoryExtractor + 'static,
    E: EmbeddingProvider + 'static,
{
    /// Create a coordinator over the given pipeline components.
    #[must_use]
    pub fn new(
        extractor: Arc<X>,
        embedder: Arc<E>,
        metadata: Arc<dyn MetadataStore>,
        vectors: Arc<dyn VectorStore>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                extractor,
                embedder,
                metadata,
                vectors,
                config,
                sessions: StdMutex::new(HashMap::new()),
            }),
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.inner.config
    }

    /// Ensure session state exists for the key. Optional: `on_message`
    /// creates it on first use.
    pub fn start_session(&self, namespace: &Namespace, session_id: &str) {
        let _ = self.inner.entry(namespace, session_id);
    }

    /// Record one conversation message.
    ///
    /// Triggers an extraction when buffered user turns or buffered tokens
    /// cross their thresholds. In async mode the extraction runs on a
    /// spawned task and this returns immediately.
    pub async fn on_message(&self, namespace: &Namespace, session_id: &str, message: &Message) {
        let entry = self.inner.entry(namespace, session_id);

        let triggered = {
            let mut state = entry.state.lock().await;
            state.buffered_tokens += message.token_count();
            state.buffer.push(message.clone());
            if state.phase == SessionPhase::Idle {
                state.phase = SessionPhase::Buffering;
            }

            let buffered_turns = count_user_turns(&state.buffer);
            buffered_turns >= self.inner.config.max_buffer_turns as u64
                || state.buffered_tokens >= self.inner.config.max_buffer_tokens
        };

        if !triggered {
            return;
        }

        if self.inner.config.async_extraction {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                inner.run_extraction(entry, true).await;
            });
        } else {
            self.inner.run_extraction(entry, true).await;
        }
    }

    /// Force an immediate extraction of everything buffered, waiting for
    /// any in-flight run to finish first.
    pub async fn flush(&self, namespace: &Namespace, session_id: &str) {
        let entry = self.inner.entry(namespace, session_id);
        self.inner.run_extraction(entry, false).await;
    }

    /// End a session: run a final synchronous extraction pass (when
    /// configured), then reset the buffer. The high-water mark survives so
    /// a re-opened session never re-extracts covered turns.
    pub async fn end_session(&self, namespace: &Namespace, session_id: &str) {
        let entry = self.inner.entry(namespace, session_id);

        if self.inner.config.extract_on_session_end {
            self.inner.run_extraction(entry.clone(), false).await;
        }

        let mut state = entry.state.lock().await;
        if !state.buffer.is_empty() {
            debug!(
                namespace = %state.namespace,
                session_id = %state.session_id,
                dropped = state.buffer.len(),
                "discarding unextracted messages at session end"
            );
        }
        state.buffer.clear();
        state.buffered_tokens = 0;
        state.phase = SessionPhase::Idle;
    }

    /// Current phase of a session, if it exists.
    pub async fn session_phase(
        &self,
        namespace: &Namespace,
        session_id: &str,
    ) -> Option<SessionPhase> {
        let entry = {
            let sessions = self.inner.sessions.lock().expect("sessions lock poisoned");
            sessions
                .get(&(namespace.to_path(), session_id.to_string()))
                .cloned()
        }?;
        let state = entry.state.lock().await;
        Some(state.phase)
    }

    /// Whether an extraction run is in flight for the session.
    pub async fn is_extracting(&self, namespace: &Namespace, session_id: &str) -> bool {
        self.session_phase(namespace, session_id).await == Some(SessionPhase::Extracting)
    }

    /// User turns already covered by persisted chunks.
    pub async fn extracted_turns(&self, namespace: &Namespace, session_id: &str) -> u64 {
        let entry = self.inner.entry(namespace, session_id);
        let state = entry.state.lock().await;
        state.extracted_turns
    }
}

impl<X, E> Inner<X, E>
where
    X: MemoryExtractor + 'static,
    E: EmbeddingProvider + 'static,
{
    fn entry(&self, namespace: &Namespace, session_id: &str) -> SessionEntry {
        let key = (namespace.to_path(), session_id.to_string());
        let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
        sessions
            .entry(key)
            .or_insert_with(|| SessionEntry {
                state: Arc::new(AsyncMutex::new(SessionState {
                    namespace: namespace.clone(),
                    session_id: session_id.to_string(),
                    buffer: Vec::new(),
                    buffered_tokens: 0,
                    extracted_turns: 0,
                    phase: SessionPhase::Idle,
                })),
                extract_lock: Arc::new(AsyncMutex::new(())),
            })
            .clone()
    }

    /// Drain the buffer chunk by chunk. With `coalesce` set, an in-flight
    /// run absorbs this trigger and the call returns immediately.
    async fn run_extraction(&self, entry: SessionEntry, coalesce: bool) {
        let _guard = if coalesce {
            let Ok(guard) = entry.extract_lock.try_lock() else {
                return;
            };
            guard
        } else {
            entry.extract_lock.lock().await
        };

        {
            let mut state = entry.state.lock().await;
            if state.buffer.is_empty() {
                return;
            }
            state.phase = SessionPhase::Extracting;
        }

        loop {
            // Snapshot the next chunk without holding the lock across the
            // LLM call. Only this run drains the buffer, so the prefix is
            // stable against concurrent appends.
            let (chunk, namespace, session_id) = {
                let state = entry.state.lock().await;
                (
                    chunk_prefix(&state.buffer, self.config.max_turns_per_extraction),
                    state.namespace.clone(),
                    state.session_id.clone(),
                )
            };
            if chunk.is_empty() {
                break;
            }

            match self.extract_chunk(&namespace, &session_id, &chunk).await {
                Ok(persisted) => {
                    let mut state = entry.state.lock().await;
                    let chunk_tokens: usize = chunk.iter().map(Message::token_count).sum();
                    state.buffer.drain(..chunk.len());
                    state.buffered_tokens = state.buffered_tokens.saturating_sub(chunk_tokens);
                    state.extracted_turns += count_user_turns(&chunk);
                    debug!(
                        namespace = %namespace,
                        session_id = %session_id,
                        persisted,
                        extracted_turns = state.extracted_turns,
                        "extraction chunk persisted"
                    );
                }
                Err(error) => {
                    // Chunk stays buffered for the next trigger.
                    warn!(
                        namespace = %namespace,
                        session_id = %session_id,
                        %error,
                        "extraction chunk failed, will retry"
                    );
                    break;
                }
            }
        }

        let mut state = entry.state.lock().await;
        state.phase = if state.buffer.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Buffering
        };
    }

    /// Extract one chunk and persist records with their embeddings.
    /// Returns the number of records persisted.
    async fn extract_chunk(
        &self,
        namespace: &Namespace,
        session_id: &str,
        chunk: &[Message],
    ) -> Result<usize, ExtractionError> {
        let truncated: Vec<Message> = chunk
            .iter()
            .map(|message| self.truncate_message(message))
            .collect();
        let transcript = render_transcript(&truncated);

        let candidates = self.extractor.extract(namespace, &transcript).await?;
        if candidates.is_empty() {
            return Ok(0);
        }

        // Extractor implementations are pluggable, so candidate values are
        // untrusted: blank or oversized content is dropped and importance
        // clamped rather than letting the record preconditions panic the
        // conversation path.
        let records: Vec<MemoryRecord> = candidates
            .into_iter()
            .filter_map(|candidate| {
                let content = candidate.content.trim().to_string();
                if content.is_empty() || content.len() > MEMORY_CONTENT_BYTES_MAX {
                    warn!(
                        namespace = %namespace,
                        content_len = content.len(),
                        "dropping candidate with unusable content"
                    );
                    return None;
                }
                let memory_type = candidate.memory_type.unwrap_or(MemoryType::Fact);
                let mut builder = MemoryRecord::builder(namespace.clone(), content, memory_type)
                    .session_id(session_id);
                if let Some(importance) = candidate.importance.filter(|i| i.is_finite()) {
                    builder = builder.importance(importance.clamp(0.0, 1.0));
                }
                Some(builder.build())
            })
            .collect();
        if records.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != records.len() {
            return Err(ExtractionError::EmbeddingMismatch {
                expected: records.len(),
                actual: embeddings.len(),
            });
        }

        self.metadata.save_all(&records).await?;
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        self.vectors.save_all(&ids, &embeddings).await?;

        Ok(records.len())
    }

    fn truncate_message(&self, message: &Message) -> Message {
        if message.token_count() <= self.config.max_tokens_per_message {
            return message.clone();
        }
        let mut truncated = message.clone();
        truncated.content = format!(
            "{}{EXTRACTION_TRUNCATION_MARKER}",
            truncate_to_tokens(&message.content, self.config.max_tokens_per_message)
        );
        truncated
    }
}

/// Number of user messages in a message sequence.
fn count_user_turns(messages: &[Message]) -> u64 {
    messages.iter().filter(|m| m.role == Role::User).count() as u64
}

/// Prefix of the buffer covering at most `max_turns` user turns, never
/// splitting a turn: the cut falls immediately before the next user
/// message.
fn chunk_prefix(buffer: &[Message], max_turns: usize) -> Vec<Message> {
    let mut turns = 0;
    let mut end = buffer.len();
    for (index, message) in buffer.iter().enumerate() {
        if message.role == Role::User {
            if turns == max_turns {
                end = index;
                break;
            }
            turns += 1;
        }
    }
    buffer[..end].to_vec()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::SimEmbeddingProvider;
    use crate::extraction::DefaultMemoryExtractor;
    use crate::llm::SimLLMProvider;
    use crate::storage::{InMemoryMetadataStore, InMemoryVectorStore};

    type SimCoordinator =
        ExtractionCoordinator<DefaultMemoryExtractor<SimLLMProvider>, SimEmbeddingProvider>;

    struct Harness {
        coordinator: SimCoordinator,
        metadata: Arc<InMemoryMetadataStore>,
    }

    fn harness(config: MemoryConfig) -> Harness {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let vectors = Arc::new(InMemoryVectorStore::new());
        let coordinator = ExtractionCoordinator::new(
            Arc::new(DefaultMemoryExtractor::new(SimLLMProvider::with_seed(42))),
            Arc::new(SimEmbeddingProvider::with_seed(42).with_dimensions(32)),
            metadata.clone() as Arc<dyn MetadataStore>,
            vectors as Arc<dyn VectorStore>,
            config,
        );
        Harness {
            coordinator,
            metadata,
        }
    }

    fn sync_config() -> MemoryConfig {
        MemoryConfig::default().with_async_extraction(false)
    }

    async fn say(h: &Harness, ns: &Namespace, session: &str, content: &str) {
        h.coordinator
            .on_message(ns, session, &Message::user(content))
            .await;
        h.coordinator
            .on_message(ns, session, &Message::assistant("noted"))
            .await;
    }

    #[test]
    fn test_chunk_prefix_never_splits_a_turn() {
        let buffer = vec![
            Message::user("q1"),
            Message::assistant("a1"),
            Message::user("q2"),
            Message::assistant("a2"),
            Message::user("q3"),
        ];
        let chunk = chunk_prefix(&buffer, 2);
        assert_eq!(chunk.len(), 4);
        assert_eq!(chunk.last().unwrap().content, "a2");
    }

    #[test]
    fn test_chunk_prefix_takes_all_when_under_limit() {
        let buffer = vec![Message::user("q1"), Message::assistant("a1")];
        assert_eq!(chunk_prefix(&buffer, 5).len(), 2);
    }

    #[tokio::test]
    async fn test_turn_trigger_extracts() {
        let h = harness(sync_config().with_max_buffer_turns(2));
        let ns = Namespace::for_user("alice");

        say(&h, &ns, "s-1", "I live in Tokyo").await;
        assert_eq!(h.metadata.count(&ns).await.unwrap(), 0);

        say(&h, &ns, "s-1", "I want to learn Rust").await;
        let count = h.metadata.count(&ns).await.unwrap();
        assert_eq!(count, 2, "both user turns should be extracted");
    }

    #[tokio::test]
    async fn test_token_trigger_extracts() {
        let h = harness(sync_config().with_max_buffer_tokens(10));
        let ns = Namespace::for_user("bob");

        say(&h, &ns, "s-1", "I recently adopted a golden retriever named Biscuit").await;
        assert!(h.metadata.count(&ns).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_records_carry_session_and_namespace() {
        let h = harness(sync_config().with_max_buffer_turns(1));
        let ns = Namespace::for_user("carol");

        say(&h, &ns, "s-9", "I am allergic to peanuts").await;

        let records = h.metadata.find_by_namespace(&ns).await.unwrap();
        assert!(!records.is_empty());
        for record in records {
            assert_eq!(record.namespace, ns);
            assert_eq!(record.session_id.as_deref(), Some("s-9"));
        }
    }

    #[tokio::test]
    async fn test_high_water_mark_no_re_extraction() {
        // 5 turns, trigger at 2: flush, 3 more turns, session end.
        // Every turn extracted exactly once.
        let h = harness(sync_config().with_max_buffer_turns(2));
        let ns = Namespace::for_user("dave");

        for i in 0..2 {
            say(&h, &ns, "s-1", &format!("early fact number {i}")).await;
        }
        h.coordinator.flush(&ns, "s-1").await;
        assert_eq!(h.coordinator.extracted_turns(&ns, "s-1").await, 2);

        for i in 0..3 {
            say(&h, &ns, "s-1", &format!("late fact number {i}")).await;
        }
        h.coordinator.end_session(&ns, "s-1").await;

        assert_eq!(h.coordinator.extracted_turns(&ns, "s-1").await, 5);
        assert_eq!(h.metadata.count(&ns).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_session_end_extracts_partial_buffer() {
        let h = harness(sync_config().with_max_buffer_turns(100));
        let ns = Namespace::for_user("erin");

        say(&h, &ns, "s-1", "I play the cello").await;
        assert_eq!(h.metadata.count(&ns).await.unwrap(), 0);

        h.coordinator.end_session(&ns, "s-1").await;
        assert_eq!(h.metadata.count(&ns).await.unwrap(), 1);
        assert_eq!(
            h.coordinator.session_phase(&ns, "s-1").await,
            Some(SessionPhase::Idle)
        );
    }

    #[tokio::test]
    async fn test_session_end_without_final_pass_discards() {
        let h = harness(
            sync_config()
                .with_max_buffer_turns(100)
                .with_extract_on_session_end(false),
        );
        let ns = Namespace::for_user("frank");

        say(&h, &ns, "s-1", "ephemeral detail").await;
        h.coordinator.end_session(&ns, "s-1").await;
        assert_eq!(h.metadata.count(&ns).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_chunk_stays_buffered_then_retries() {
        use crate::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};

        // First LLM call fails, later calls succeed.
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::LlmTimeout, 1.0).with_max_injections(1));

        let metadata = Arc::new(InMemoryMetadataStore::new());
        let vectors = Arc::new(InMemoryVectorStore::new());
        let coordinator = ExtractionCoordinator::new(
            Arc::new(DefaultMemoryExtractor::new(SimLLMProvider::with_faults(
                42,
                Arc::new(injector),
            ))),
            Arc::new(SimEmbeddingProvider::with_seed(42).with_dimensions(32)),
            metadata.clone() as Arc<dyn MetadataStore>,
            vectors as Arc<dyn VectorStore>,
            sync_config().with_max_buffer_turns(1),
        );
        let ns = Namespace::for_user("grace");

        // Trigger fires, chunk fails, turn stays buffered.
        coordinator
            .on_message(&ns, "s-1", &Message::user("I collect vinyl records"))
            .await;
        assert_eq!(metadata.count(&ns).await.unwrap(), 0);
        assert_eq!(coordinator.extracted_turns(&ns, "s-1").await, 0);

        // Next trigger retries the same turn successfully.
        coordinator
            .on_message(&ns, "s-1", &Message::user("I also collect stamps"))
            .await;
        assert_eq!(metadata.count(&ns).await.unwrap(), 2);
        assert_eq!(coordinator.extracted_turns(&ns, "s-1").await, 2);
    }

    #[tokio::test]
    async fn test_untrusted_extractor_candidates_sanitized() {
        use crate::extraction::{ExtractionError, MemoryCandidate};
        use async_trait::async_trait;

        // Extractor implementations are pluggable and may hand back values
        // the record preconditions would reject.
        struct SloppyExtractor;

        #[async_trait]
        impl crate::extraction::MemoryExtractor for SloppyExtractor {
            async fn extract(
                &self,
                _namespace: &Namespace,
                _transcript: &str,
            ) -> Result<Vec<MemoryCandidate>, ExtractionError> {
                Ok(vec![
                    MemoryCandidate {
                        content: "   ".to_string(),
                        memory_type: None,
                        importance: Some(1.5),
                    },
                    MemoryCandidate {
                        content: "keeps bees".to_string(),
                        memory_type: Some(MemoryType::Fact),
                        importance: Some(7.5),
                    },
                ])
            }
        }

        let metadata = Arc::new(InMemoryMetadataStore::new());
        let vectors = Arc::new(InMemoryVectorStore::new());
        let coordinator = ExtractionCoordinator::new(
            Arc::new(SloppyExtractor),
            Arc::new(SimEmbeddingProvider::with_seed(42).with_dimensions(32)),
            metadata.clone() as Arc<dyn MetadataStore>,
            vectors as Arc<dyn VectorStore>,
            sync_config().with_max_buffer_turns(1),
        );
        let ns = Namespace::for_user("judy");

        // Must not panic: blank content is dropped, importance clamped.
        coordinator
            .on_message(&ns, "s-1", &Message::user("I keep bees"))
            .await;

        let records = metadata.find_by_namespace(&ns).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "keeps bees");
        assert_eq!(records[0].importance, 1.0);
        assert_eq!(coordinator.extracted_turns(&ns, "s-1").await, 1);
    }

    #[tokio::test]
    async fn test_all_candidates_unusable_still_advances() {
        use crate::extraction::{ExtractionError, MemoryCandidate};
        use async_trait::async_trait;

        struct BlankExtractor;

        #[async_trait]
        impl crate::extraction::MemoryExtractor for BlankExtractor {
            async fn extract(
                &self,
                _namespace: &Namespace,
                _transcript: &str,
            ) -> Result<Vec<MemoryCandidate>, ExtractionError> {
                Ok(vec![MemoryCandidate {
                    content: String::new(),
                    memory_type: None,
                    importance: None,
                }])
            }
        }

        let metadata = Arc::new(InMemoryMetadataStore::new());
        let vectors = Arc::new(InMemoryVectorStore::new());
        let coordinator = ExtractionCoordinator::new(
            Arc::new(BlankExtractor),
            Arc::new(SimEmbeddingProvider::with_seed(42).with_dimensions(32)),
            metadata.clone() as Arc<dyn MetadataStore>,
            vectors as Arc<dyn VectorStore>,
            sync_config().with_max_buffer_turns(1),
        );
        let ns = Namespace::for_user("kim");

        coordinator
            .on_message(&ns, "s-1", &Message::user("hello"))
            .await;

        // Nothing persisted, but the turn is covered and not re-extracted.
        assert_eq!(metadata.count(&ns).await.unwrap(), 0);
        assert_eq!(coordinator.extracted_turns(&ns, "s-1").await, 1);
    }

    #[tokio::test]
    async fn test_async_extraction_completes() {
        let h = harness(MemoryConfig::default().with_max_buffer_turns(1));
        let ns = Namespace::for_user("heidi");

        say(&h, &ns, "s-1", "I run marathons").await;

        // Spawned task; wait for it to drain the buffer.
        for _ in 0..100 {
            if h.metadata.count(&ns).await.unwrap() > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(h.metadata.count(&ns).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let h = harness(sync_config().with_max_buffer_turns(2));
        let ns = Namespace::for_user("ivan");

        say(&h, &ns, "s-1", "turn in session one").await;
        say(&h, &ns, "s-2", "turn in session two").await;

        // Neither session reached its own threshold.
        assert_eq!(h.metadata.count(&ns).await.unwrap(), 0);
        assert_eq!(h.coordinator.extracted_turns(&ns, "s-1").await, 0);
    }

    #[tokio::test]
    async fn test_truncation_marker_applied() {
        let h = harness(sync_config().with_max_tokens_per_message(5));
        let long = "word ".repeat(100);
        let message = Message::user(long);
        let truncated = h.coordinator.inner.truncate_message(&message);
        assert!(truncated.content.ends_with("[truncated]"));
        assert!(truncated.content.len() < message.content.len());
    }
}
