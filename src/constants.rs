//! `TigerStyle` Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`
//! Example: `MEMORY_CONTENT_BYTES_MAX` (not `MAX_MEMORY_CONTENT_SIZE`)
//!
//! Every constant includes units in the name:
//! - `_BYTES_MAX/MIN` for size limits
//! - `_TOKENS_*` for token budgets
//! - `_COUNT_*` for quantity limits
//! - `_RATIO_*` for fractions

// =============================================================================
// Namespace Limits
// =============================================================================

/// Maximum number of segments in a namespace path
pub const NAMESPACE_SEGMENTS_COUNT_MAX: usize = 16;

/// Maximum length of a single namespace segment
pub const NAMESPACE_SEGMENT_BYTES_MAX: usize = 128;

// =============================================================================
// Memory Record Limits
// =============================================================================

/// Maximum size of memory record content
pub const MEMORY_CONTENT_BYTES_MAX: usize = 100_000; // 100KB

/// Minimum importance value
pub const MEMORY_IMPORTANCE_MIN: f64 = 0.0;

/// Maximum importance value
pub const MEMORY_IMPORTANCE_MAX: f64 = 1.0;

/// Initial decay factor for a freshly created record
pub const MEMORY_DECAY_FACTOR_INITIAL: f64 = 1.0;

// =============================================================================
// Decay Model
// =============================================================================

/// Fallback decay rate when no per-type rate applies
pub const DECAY_RATE_DEFAULT: f64 = 0.02;

/// Decay rate for facts
pub const DECAY_RATE_FACT: f64 = 0.02;

/// Decay rate for preferences
pub const DECAY_RATE_PREFERENCE: f64 = 0.015;

/// Decay rate for goals (slowest)
pub const DECAY_RATE_GOAL: f64 = 0.01;

/// Decay rate for episodes (fastest)
pub const DECAY_RATE_EPISODE: f64 = 0.05;

/// Decay rate for relationships
pub const DECAY_RATE_RELATIONSHIP: f64 = 0.01;

/// Default importance for facts
pub const IMPORTANCE_FACT_DEFAULT: f64 = 0.7;

/// Default importance for preferences
pub const IMPORTANCE_PREFERENCE_DEFAULT: f64 = 0.8;

/// Default importance for goals
pub const IMPORTANCE_GOAL_DEFAULT: f64 = 0.9;

/// Default importance for episodes
pub const IMPORTANCE_EPISODE_DEFAULT: f64 = 0.6;

/// Default importance for relationships
pub const IMPORTANCE_RELATIONSHIP_DEFAULT: f64 = 0.75;

// =============================================================================
// Short-Term Buffer Limits
// =============================================================================

/// Default maximum messages held in the short-term buffer
pub const BUFFER_MESSAGES_COUNT_DEFAULT: usize = 20;

/// Default token budget for the short-term buffer
pub const BUFFER_TOKENS_COUNT_DEFAULT: usize = 4000;

/// Fraction of a model's context window granted to the buffer
pub const BUFFER_CONTEXT_WINDOW_RATIO_DEFAULT: f64 = 0.8;

/// Context window assumed for models not in the lookup table
pub const MODEL_CONTEXT_TOKENS_FALLBACK: usize = 8192;

// =============================================================================
// Extraction Limits
// =============================================================================

/// Default user-turn count that triggers a batch extraction
pub const EXTRACTION_BUFFER_TURNS_DEFAULT: usize = 10;

/// Default buffered-token count that triggers a batch extraction
pub const EXTRACTION_BUFFER_TOKENS_DEFAULT: usize = 2000;

/// Default maximum user turns per extraction chunk
pub const EXTRACTION_TURNS_PER_CHUNK_DEFAULT: usize = 5;

/// Default per-message token cap before truncation
pub const EXTRACTION_MESSAGE_TOKENS_MAX_DEFAULT: usize = 1000;

/// Marker appended to truncated message content
pub const EXTRACTION_TRUNCATION_MARKER: &str = "\n[truncated]";

/// Maximum candidates accepted from one extraction response
pub const EXTRACTION_CANDIDATES_COUNT_MAX: usize = 50;

// =============================================================================
// Recall Limits
// =============================================================================

/// Over-fetch multiplier applied to `top_k` before post-filtering
pub const RECALL_CANDIDATE_MULTIPLIER: usize = 3;

/// Minimum candidate count requested from the vector store
pub const RECALL_CANDIDATES_COUNT_MIN: usize = 20;

/// Records whose recomputed decay falls below this are logically forgotten
pub const RECALL_DECAY_FLOOR: f64 = 0.01;

/// Frequency bonus factor: `1 + FACTOR * ln(1 + access_count)`
pub const RECALL_FREQUENCY_BONUS_FACTOR: f64 = 0.1;

/// Default number of recall results
pub const RECALL_RESULTS_COUNT_DEFAULT: usize = 5;

/// Maximum number of recall results
pub const RECALL_RESULTS_COUNT_MAX: usize = 100;

/// Maximum length of a recall query
pub const RECALL_QUERY_BYTES_MAX: usize = 10_000;

// =============================================================================
// Context Budget
// =============================================================================

/// Default fraction of model context reserved for recalled memories
pub const CONTEXT_MEMORY_BUDGET_RATIO_DEFAULT: f64 = 0.1;

/// Default decay threshold below which a sweep deletes records
pub const DECAY_SWEEP_THRESHOLD_DEFAULT: f64 = 0.1;

// =============================================================================
// Embedding Limits
// =============================================================================

/// Dimensions produced by the simulation embedding provider
pub const EMBEDDING_DIMENSIONS_COUNT: usize = 1536;

/// Maximum batch size for embedding requests
pub const EMBEDDING_BATCH_SIZE_MAX: usize = 100;

// =============================================================================
// LLM Limits
// =============================================================================

/// Maximum size of an LLM prompt
pub const LLM_PROMPT_BYTES_MAX: usize = 100_000; // 100KB

// =============================================================================
// DST (Deterministic Simulation Testing) Limits
// =============================================================================

/// Maximum probability for fault injection (1.0 = 100%)
pub const DST_FAULT_PROBABILITY_MAX: f64 = 1.0;

// =============================================================================
// Tests
// =============================================================================
