//! End-to-end pipeline tests over the fully simulated engine:
//! deterministic providers, in-memory stores, no network.

use std::sync::Arc;

use engram::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType};
use engram::embedding::{EmbeddingProvider, SimEmbeddingProvider};
use engram::extraction::DefaultMemoryExtractor;
use engram::llm::SimLLMProvider;
use engram::storage::{InMemoryMetadataStore, InMemoryVectorStore, MetadataStore, VectorStore};
use engram::{MemoryConfig, MemoryEngine, MemoryType, Message, Namespace, SimMemoryEngine};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn sim_engine(seed: u64, config: MemoryConfig) -> SimMemoryEngine {
    init_tracing();
    MemoryEngine::new(
        Arc::new(InMemoryMetadataStore::new()),
        Arc::new(InMemoryVectorStore::new()),
        DefaultMemoryExtractor::new(SimLLMProvider::with_seed(seed)),
        SimEmbeddingProvider::with_seed(seed),
        config.with_async_extraction(false),
    )
}

async fn converse(engine: &SimMemoryEngine, ns: &Namespace, session: &str, turns: &[&str]) {
    for turn in turns {
        engine.on_message(ns, session, &Message::user(*turn)).await;
        engine
            .on_message(ns, session, &Message::assistant("Understood."))
            .await;
    }
}

#[tokio::test]
async fn conversation_becomes_recallable_memory() {
    let engine = sim_engine(
        42,
        MemoryConfig::default()
            .with_max_buffer_turns(2)
            .with_max_turns_per_extraction(2),
    );
    let ns = Namespace::for_user("alice");

    converse(
        &engine,
        &ns,
        "session-1",
        &[
            "I live in Tokyo",
            "I am allergic to peanuts",
            "I want to learn Rust",
        ],
    )
    .await;
    engine.end_session(&ns, "session-1").await;

    assert_eq!(engine.count(&ns).await.unwrap(), 3);

    let results = engine
        .recall(&ns, "I am allergic to peanuts", 1)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.content, "I am allergic to peanuts");
    assert!(results[0].similarity > 0.99);
    assert_eq!(results[0].record.session_id.as_deref(), Some("session-1"));
}

#[tokio::test]
async fn recalled_memories_render_as_context_block() {
    let engine = sim_engine(42, MemoryConfig::default());
    let ns = Namespace::for_user("alice");

    engine
        .remember(&ns, "Allergic to peanuts", MemoryType::Fact, Some(0.9))
        .await
        .unwrap();
    engine
        .remember(&ns, "Prefers vegetarian food", MemoryType::Preference, None)
        .await
        .unwrap();

    let results = engine.recall(&ns, "food restrictions", 5).await.unwrap();
    assert_eq!(results.len(), 2);

    let block = engine.format_as_context(&results, "gpt-4o");
    assert!(block.starts_with("[User Memory]\n"));
    assert!(block.contains("Allergic to peanuts"));
    assert!(block.contains("Prefers vegetarian food"));
}

#[tokio::test]
async fn forget_removes_memory_from_recall() {
    let engine = sim_engine(42, MemoryConfig::default());
    let ns = Namespace::for_user("alice");

    let record = engine
        .remember(&ns, "Drives a red bicycle", MemoryType::Fact, None)
        .await
        .unwrap();
    assert!(engine.forget(&record.id).await.unwrap());

    let results = engine.recall(&ns, "Drives a red bicycle", 3).await.unwrap();
    assert!(results.is_empty());
    assert!(!engine.has_memories(&ns).await.unwrap());
}

#[tokio::test]
async fn users_never_see_each_others_memories() {
    let engine = sim_engine(42, MemoryConfig::default().with_max_buffer_turns(1));
    let alice = Namespace::for_user("alice");
    let bob = Namespace::for_user("bob");

    converse(&engine, &alice, "s-a", &["I work as a nurse"]).await;
    converse(&engine, &bob, "s-b", &["I work as a pilot"]).await;

    let for_bob = engine.recall(&bob, "I work as a nurse", 5).await.unwrap();
    assert!(for_bob.iter().all(|m| m.record.content != "I work as a nurse"));

    let for_alice = engine.recall(&alice, "I work as a nurse", 5).await.unwrap();
    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0].record.namespace, alice);
}

#[tokio::test]
async fn embedding_outage_degrades_recall_to_empty() {
    let mut injector = FaultInjector::new(DeterministicRng::new(7));
    injector.register(FaultConfig::new(FaultType::EmbeddingTimeout, 1.0));
    let engine = MemoryEngine::new(
        Arc::new(InMemoryMetadataStore::new()),
        Arc::new(InMemoryVectorStore::new()),
        DefaultMemoryExtractor::new(SimLLMProvider::with_seed(7)),
        SimEmbeddingProvider::with_faults(7, Arc::new(injector)),
        MemoryConfig::default().with_async_extraction(false),
    );

    let results = engine
        .recall(&Namespace::for_user("alice"), "anything at all", 3)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn decay_sweep_prunes_stale_memories_end_to_end() {
    use chrono::{Duration, Utc};
    use engram::MemoryRecord;

    let metadata = Arc::new(InMemoryMetadataStore::new());
    let vectors = Arc::new(InMemoryVectorStore::new());
    let embedder = SimEmbeddingProvider::with_seed(42);
    let engine = MemoryEngine::new(
        metadata.clone(),
        vectors.clone(),
        DefaultMemoryExtractor::new(SimLLMProvider::with_seed(42)),
        embedder,
        MemoryConfig::default().with_async_extraction(false),
    );
    let ns = Namespace::for_user("alice");

    engine
        .remember(&ns, "still relevant", MemoryType::Fact, None)
        .await
        .unwrap();

    let stale = MemoryRecord::builder(ns.clone(), "long forgotten outing", MemoryType::Episode)
        .last_accessed_at(Some(Utc::now() - Duration::days(365)))
        .build();
    metadata.save(&stale).await.unwrap();
    let seeder = SimEmbeddingProvider::with_seed(42);
    let embedding = seeder.embed(&stale.content).await.unwrap();
    vectors.save(&stale.id, &embedding).await.unwrap();

    let report = engine.run_decay_sweep(&ns).await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.updated, 1);

    let results = engine.recall(&ns, "still relevant", 5).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.content, "still relevant");
}

#[tokio::test]
async fn same_seed_same_memories() {
    let turns = ["I live in Tokyo", "I want to learn Rust"];
    let mut extracted = Vec::new();

    for _ in 0..2 {
        let engine = sim_engine(42, MemoryConfig::default().with_max_buffer_turns(1));
        let ns = Namespace::for_user("alice");
        converse(&engine, &ns, "s-1", &turns).await;
        engine.end_session(&ns, "s-1").await;

        let results = engine.recall(&ns, "I live in Tokyo", 5).await.unwrap();
        let mut contents: Vec<String> =
            results.into_iter().map(|m| m.record.content).collect();
        contents.sort();
        extracted.push(contents);
    }

    assert_eq!(extracted[0], extracted[1]);
    assert!(!extracted[0].is_empty());
}
