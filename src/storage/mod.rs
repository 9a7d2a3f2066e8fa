//! Storage Layer
//!
//! Dual-store model: record attributes live behind [`MetadataStore`],
//! embeddings behind [`VectorStore`]. The engine owns keeping them in sync.

mod error;
mod filter;
mod metadata;
mod record;
mod vector;

pub use error::{StorageError, StorageResult};
pub use filter::{SearchFilter, SearchFilterBuilder};
pub use metadata::{InMemoryMetadataStore, MetadataStore};
pub use record::{MemoryRecord, MemoryRecordBuilder, MemoryType};
pub use vector::{cosine_similarity, InMemoryVectorStore, VectorMatch, VectorStore};
