//! Engram - Two-Tier Conversational Memory
//!
//! A memory engine for conversational agents: a bounded short-term buffer
//! for the live conversation, and a long-term store of extracted memories
//! with time decay, namespace isolation, and similarity-ranked recall.
//!
//! Conversation messages flow through [`MemoryEngine::on_message`]; an LLM
//! extracts durable facts, preferences, goals, episodes, and relationships
//! in batched chunks, embeds them, and persists them per namespace. Recall
//! ranks stored memories by `similarity x importance x decay x frequency`.
//!
//! Everything is testable without network access: deterministic sim
//! providers ([`llm::SimLLMProvider`], [`embedding::SimEmbeddingProvider`])
//! and in-memory stores stand in for real backends, with seeded fault
//! injection via [`dst`].
//!
//! # Quick start
//!
//! ```rust
//! use engram::{MemoryEngine, Message, Namespace};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = MemoryEngine::sim(42);
//! let ns = Namespace::for_user("alice");
//!
//! engine.on_message(&ns, "session-1", &Message::user("I live in Tokyo")).await;
//! engine.on_message(&ns, "session-1", &Message::assistant("Noted!")).await;
//! engine.end_session(&ns, "session-1").await;
//!
//! let memories = engine.recall(&ns, "where does the user live?", 3).await.unwrap();
//! assert!(!memories.is_empty());
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod constants;
pub mod decay;
pub mod dst;
pub mod embedding;
mod engine;
pub mod extraction;
pub mod llm;
pub mod message;
pub mod namespace;
pub mod recall;
pub mod storage;

pub use config::MemoryConfig;
pub use engine::{MemoryEngine, MemoryError, SimMemoryEngine, SweepReport};
pub use message::{Message, Role};
pub use namespace::Namespace;
pub use recall::ScoredMemory;
pub use storage::{MemoryRecord, MemoryType, SearchFilter};
