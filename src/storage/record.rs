//! Memory Records
//!
//! `TigerStyle`: Records are validated at construction; content is immutable
//! once stored (corrections are new records, not edits).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    IMPORTANCE_EPISODE_DEFAULT, IMPORTANCE_FACT_DEFAULT, IMPORTANCE_GOAL_DEFAULT,
    IMPORTANCE_PREFERENCE_DEFAULT, IMPORTANCE_RELATIONSHIP_DEFAULT, MEMORY_CONTENT_BYTES_MAX,
    MEMORY_DECAY_FACTOR_INITIAL, MEMORY_IMPORTANCE_MAX, MEMORY_IMPORTANCE_MIN,
    RECALL_FREQUENCY_BONUS_FACTOR,
};
use crate::constants::{
    DECAY_RATE_EPISODE, DECAY_RATE_FACT, DECAY_RATE_GOAL, DECAY_RATE_PREFERENCE,
    DECAY_RATE_RELATIONSHIP,
};
use crate::namespace::Namespace;

// =============================================================================
// MemoryType
// =============================================================================

/// Category of a long-term memory.
///
/// Each type carries a default importance and a decay rate: episodes fade
/// fastest, goals and relationships slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// Objective statement about the user or world
    Fact,
    /// Stable user preference
    Preference,
    /// Stated objective or intention
    Goal,
    /// Specific event tied to a point in time
    Episode,
    /// Connection between the user and other people or things
    Relationship,
}

impl MemoryType {
    /// All memory types, in declaration order.
    #[must_use]
    pub fn all() -> [Self; 5] {
        [
            Self::Fact,
            Self::Preference,
            Self::Goal,
            Self::Episode,
            Self::Relationship,
        ]
    }

    /// Importance assigned when the extractor does not supply one.
    #[must_use]
    pub fn default_importance(&self) -> f64 {
        match self {
            Self::Fact => IMPORTANCE_FACT_DEFAULT,
            Self::Preference => IMPORTANCE_PREFERENCE_DEFAULT,
            Self::Goal => IMPORTANCE_GOAL_DEFAULT,
            Self::Episode => IMPORTANCE_EPISODE_DEFAULT,
            Self::Relationship => IMPORTANCE_RELATIONSHIP_DEFAULT,
        }
    }

    /// Per-day exponential decay rate.
    #[must_use]
    pub fn decay_rate(&self) -> f64 {
        match self {
            Self::Fact => DECAY_RATE_FACT,
            Self::Preference => DECAY_RATE_PREFERENCE,
            Self::Goal => DECAY_RATE_GOAL,
            Self::Episode => DECAY_RATE_EPISODE,
            Self::Relationship => DECAY_RATE_RELATIONSHIP,
        }
    }

    /// Stable string form, matching the serde representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fact => "fact",
            Self::Preference => "preference",
            Self::Goal => "goal",
            Self::Episode => "episode",
            Self::Relationship => "relationship",
        }
    }

    /// Parse from the stable string form (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fact" => Some(Self::Fact),
            "preference" => Some(Self::Preference),
            "goal" => Some(Self::Goal),
            "episode" => Some(Self::Episode),
            "relationship" => Some(Self::Relationship),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// MemoryRecord
// =============================================================================

/// A single long-term memory.
///
/// # Example
///
/// ```rust
/// use engram::{MemoryRecord, MemoryType, Namespace};
///
/// let record = MemoryRecord::new(
///     Namespace::for_user("alice"),
///     "Prefers window seats on long flights",
///     MemoryType::Preference,
/// );
/// assert_eq!(record.importance, MemoryType::Preference.default_importance());
/// assert_eq!(record.decay_factor, 1.0);
/// assert_eq!(record.access_count, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique id (uuid v4), immutable
    pub id: String,
    /// Scope of the record
    pub namespace: Namespace,
    /// Memory text, immutable once stored
    pub content: String,
    /// Category
    pub memory_type: MemoryType,
    /// Importance in [0, 1]
    pub importance: f64,
    /// Current decay factor in [0, 1], starts at 1.0
    pub decay_factor: f64,
    /// Number of recalls that returned this record
    pub access_count: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last access timestamp (creation counts as the first access)
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Originating session, if extracted from a conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Free-form string metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl MemoryRecord {
    /// Create a record with type-default importance and a fresh decay factor.
    ///
    /// # Panics
    /// Panics if content is blank or oversized.
    #[must_use]
    pub fn new(namespace: Namespace, content: impl Into<String>, memory_type: MemoryType) -> Self {
        let content = content.into();

        // Preconditions
        assert!(!content.trim().is_empty(), "content cannot be blank");
        assert!(
            content.len() <= MEMORY_CONTENT_BYTES_MAX,
            "content must be <= {MEMORY_CONTENT_BYTES_MAX} bytes"
        );

        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            namespace,
            content,
            memory_type,
            importance: memory_type.default_importance(),
            decay_factor: MEMORY_DECAY_FACTOR_INITIAL,
            access_count: 0,
            created_at: now,
            last_accessed_at: Some(now),
            session_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Start building a record with non-default fields.
    #[must_use]
    pub fn builder(
        namespace: Namespace,
        content: impl Into<String>,
        memory_type: MemoryType,
    ) -> MemoryRecordBuilder {
        MemoryRecordBuilder {
            record: Self::new(namespace, content, memory_type),
        }
    }

    /// Record one access: bump the count and refresh the access timestamp.
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Some(Utc::now());
    }

    /// Combined retrieval score:
    /// `similarity * importance * decay_factor * (1 + 0.1 * ln(1 + access_count))`.
    ///
    /// Uses the stored decay factor; recall recomputes it first so scoring
    /// reflects elapsed time even between sweeps.
    #[must_use]
    pub fn effective_score(&self, similarity: f64) -> f64 {
        let access_count = self.access_count as f64;
        let frequency_bonus = 1.0 + RECALL_FREQUENCY_BONUS_FACTOR * (1.0 + access_count).ln();
        similarity * self.importance * self.decay_factor * frequency_bonus
    }
}

/// Builder for [`MemoryRecord`].
#[derive(Debug)]
pub struct MemoryRecordBuilder {
    record: MemoryRecord,
}

impl MemoryRecordBuilder {
    /// Override the generated id (stable ids for tests and migrations).
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.record.id = id.into();
        self
    }

    /// Set importance.
    ///
    /// # Panics
    /// Panics if importance is outside [0, 1].
    #[must_use]
    pub fn importance(mut self, importance: f64) -> Self {
        // Precondition
        assert!(
            (MEMORY_IMPORTANCE_MIN..=MEMORY_IMPORTANCE_MAX).contains(&importance),
            "importance must be in [{MEMORY_IMPORTANCE_MIN}, {MEMORY_IMPORTANCE_MAX}], got {importance}"
        );
        self.record.importance = importance;
        self
    }

    /// Set the originating session.
    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.record.session_id = Some(session_id.into());
        self
    }

    /// Attach one metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.metadata.insert(key.into(), value.into());
        self
    }

    /// Override creation time (for tests and imports).
    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.record.created_at = created_at;
        self
    }

    /// Override the last access time (for tests and imports).
    #[must_use]
    pub fn last_accessed_at(mut self, last_accessed_at: Option<DateTime<Utc>>) -> Self {
        self.record.last_accessed_at = last_accessed_at;
        self
    }

    /// Override the access count (for tests and imports).
    #[must_use]
    pub fn access_count(mut self, access_count: u64) -> Self {
        self.record.access_count = access_count;
        self
    }

    /// Override the decay factor (for tests and imports).
    ///
    /// # Panics
    /// Panics if the factor is outside [0, 1].
    #[must_use]
    pub fn decay_factor(mut self, decay_factor: f64) -> Self {
        // Precondition
        assert!(
            (0.0..=1.0).contains(&decay_factor),
            "decay_factor must be in [0, 1], got {decay_factor}"
        );
        self.record.decay_factor = decay_factor;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> MemoryRecord {
        self.record
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MemoryRecord {
        MemoryRecord::new(
            Namespace::for_user("alice"),
            "Works as a marine biologist",
            MemoryType::Fact,
        )
    }

    #[test]
    fn test_new_defaults() {
        let r = record();
        assert_eq!(r.importance, 0.7);
        assert_eq!(r.decay_factor, 1.0);
        assert_eq!(r.access_count, 0);
        assert!(r.last_accessed_at.is_some());
        assert!(r.session_id.is_none());
        assert!(!r.id.is_empty());
    }

    #[test]
    fn test_type_defaults() {
        assert_eq!(MemoryType::Fact.default_importance(), 0.7);
        assert_eq!(MemoryType::Preference.default_importance(), 0.8);
        assert_eq!(MemoryType::Goal.default_importance(), 0.9);
        assert_eq!(MemoryType::Episode.default_importance(), 0.6);
        assert_eq!(MemoryType::Relationship.default_importance(), 0.75);

        assert_eq!(MemoryType::Episode.decay_rate(), 0.05);
        assert_eq!(MemoryType::Goal.decay_rate(), 0.01);
    }

    #[test]
    fn test_type_string_round_trip() {
        for t in MemoryType::all() {
            assert_eq!(MemoryType::parse(t.as_str()), Some(t));
        }
        assert_eq!(MemoryType::parse("FACT"), Some(MemoryType::Fact));
        assert_eq!(MemoryType::parse("unknown"), None);
    }

    #[test]
    fn test_record_access() {
        let mut r = record();
        let before = r.last_accessed_at;
        r.record_access();
        assert_eq!(r.access_count, 1);
        assert!(r.last_accessed_at >= before);
    }

    #[test]
    fn test_effective_score_worked_example() {
        // 0.95 * 0.8 * 0.9 * (1 + 0.1 * ln 6) = 0.806..
        let r = MemoryRecord::builder(
            Namespace::for_user("alice"),
            "Prefers aisle seats",
            MemoryType::Preference,
        )
        .importance(0.8)
        .decay_factor(0.9)
        .access_count(5)
        .build();

        let score = r.effective_score(0.95);
        assert!((score - 0.95 * 0.8 * 0.9 * (1.0 + 0.1 * 6.0_f64.ln())).abs() < 1e-12);
        assert!((score - 0.80).abs() < 0.01);

        let weak = MemoryRecord::builder(Namespace::for_user("alice"), "old note", MemoryType::Episode)
            .importance(0.6)
            .decay_factor(0.5)
            .build();
        assert!(score > weak.effective_score(0.95));
    }

    #[test]
    fn test_effective_score_monotone_in_each_factor() {
        let base = record();

        let mut more_important = base.clone();
        more_important.importance = base.importance + 0.2;
        assert!(more_important.effective_score(0.5) > base.effective_score(0.5));

        let mut less_decayed = base.clone();
        less_decayed.decay_factor = 0.5;
        assert!(less_decayed.effective_score(0.5) < base.effective_score(0.5));

        let mut more_accessed = base.clone();
        more_accessed.access_count = 10;
        assert!(more_accessed.effective_score(0.5) > base.effective_score(0.5));

        assert!(base.effective_score(0.9) > base.effective_score(0.5));
    }

    #[test]
    fn test_effective_score_zero_similarity() {
        assert_eq!(record().effective_score(0.0), 0.0);
    }

    #[test]
    fn test_builder() {
        let r = MemoryRecord::builder(Namespace::global(), "Wants to learn Rust", MemoryType::Goal)
            .id("mem-1")
            .importance(0.95)
            .session_id("s-1")
            .metadata("source", "extraction")
            .build();

        assert_eq!(r.id, "mem-1");
        assert_eq!(r.importance, 0.95);
        assert_eq!(r.session_id.as_deref(), Some("s-1"));
        assert_eq!(r.metadata.get("source").map(String::as_str), Some("extraction"));
    }

    #[test]
    fn test_serde_round_trip() {
        let r = record();
        let json = serde_json::to_string(&r).unwrap();
        let back: MemoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    #[should_panic(expected = "content cannot be blank")]
    fn test_blank_content_rejected() {
        let _ = MemoryRecord::new(Namespace::global(), "  ", MemoryType::Fact);
    }

    #[test]
    #[should_panic(expected = "importance must be in")]
    fn test_importance_out_of_range() {
        let _ = MemoryRecord::builder(Namespace::global(), "x", MemoryType::Fact)
            .importance(1.5)
            .build();
    }
}
