//! Search Filters
//!
//! Immutable conjunction predicate over record attributes. Unset criteria
//! never exclude anything, so the empty filter matches every record.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::record::{MemoryRecord, MemoryType};

/// Attribute filter applied before (store push-down) or after (engine
/// post-filter) vector search.
///
/// # Example
///
/// ```rust
/// use engram::{MemoryType, SearchFilter};
///
/// let filter = SearchFilter::builder()
///     .memory_types([MemoryType::Preference, MemoryType::Goal])
///     .min_importance(0.5)
///     .build();
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    /// Acceptable memory types (empty = all)
    pub memory_types: HashSet<MemoryType>,
    /// Minimum importance, inclusive
    pub min_importance: Option<f64>,
    /// Minimum decay factor, inclusive
    pub min_decay_factor: Option<f64>,
    /// Only records created at or after this instant
    pub created_after: Option<DateTime<Utc>>,
    /// Only records created at or before this instant
    pub created_before: Option<DateTime<Utc>>,
}

impl SearchFilter {
    /// Start building a filter.
    #[must_use]
    pub fn builder() -> SearchFilterBuilder {
        SearchFilterBuilder {
            filter: Self::default(),
        }
    }

    /// Check whether a record satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        if !self.memory_types.is_empty() && !self.memory_types.contains(&record.memory_type) {
            return false;
        }
        if let Some(min) = self.min_importance {
            if record.importance < min {
                return false;
            }
        }
        if let Some(min) = self.min_decay_factor {
            if record.decay_factor < min {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if record.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if record.created_at > before {
                return false;
            }
        }
        true
    }

    /// Whether any criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memory_types.is_empty()
            && self.min_importance.is_none()
            && self.min_decay_factor.is_none()
            && self.created_after.is_none()
            && self.created_before.is_none()
    }
}

/// Builder for [`SearchFilter`].
#[derive(Debug, Default)]
pub struct SearchFilterBuilder {
    filter: SearchFilter,
}

impl SearchFilterBuilder {
    /// Restrict to the given memory types.
    #[must_use]
    pub fn memory_types(mut self, types: impl IntoIterator<Item = MemoryType>) -> Self {
        self.filter.memory_types = types.into_iter().collect();
        self
    }

    /// Require importance >= min.
    ///
    /// # Panics
    /// Panics if min is outside [0, 1].
    #[must_use]
    pub fn min_importance(mut self, min: f64) -> Self {
        // Precondition
        assert!((0.0..=1.0).contains(&min), "min_importance must be in [0, 1]");
        self.filter.min_importance = Some(min);
        self
    }

    /// Require decay_factor >= min.
    ///
    /// # Panics
    /// Panics if min is outside [0, 1].
    #[must_use]
    pub fn min_decay_factor(mut self, min: f64) -> Self {
        // Precondition
        assert!((0.0..=1.0).contains(&min), "min_decay_factor must be in [0, 1]");
        self.filter.min_decay_factor = Some(min);
        self
    }

    /// Require created_at >= instant.
    #[must_use]
    pub fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.filter.created_after = Some(instant);
        self
    }

    /// Require created_at <= instant.
    #[must_use]
    pub fn created_before(mut self, instant: DateTime<Utc>) -> Self {
        self.filter.created_before = Some(instant);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> SearchFilter {
        self.filter
    }
}
