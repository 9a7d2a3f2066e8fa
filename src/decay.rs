//! Decay - Time-Based Memory Fade
//!
//! Pure exponential model: `decay = exp(-rate * days_since_last_access)`,
//! where days are whole elapsed days (clamped at zero against clock skew).
//! A record with no recorded access does not decay.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::constants::DECAY_RATE_DEFAULT;
use crate::storage::{MemoryRecord, MemoryType};

// =============================================================================
// DecayRates
// =============================================================================

/// Per-type decay rate table, tunable per engine instance.
#[derive(Debug, Clone)]
pub struct DecayRates {
    default_rate: f64,
    overrides: HashMap<MemoryType, f64>,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            default_rate: DECAY_RATE_DEFAULT,
            overrides: HashMap::new(),
        }
    }
}

impl DecayRates {
    /// Rate table using each type's built-in rate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the rate for one type.
    ///
    /// # Panics
    /// Panics if the rate is negative.
    #[must_use]
    pub fn with_rate(mut self, memory_type: MemoryType, rate: f64) -> Self {
        // Precondition
        assert!(rate >= 0.0, "decay rate must be non-negative, got {rate}");
        self.overrides.insert(memory_type, rate);
        self
    }

    /// Override the fallback rate.
    ///
    /// # Panics
    /// Panics if the rate is negative.
    #[must_use]
    pub fn with_default_rate(mut self, rate: f64) -> Self {
        // Precondition
        assert!(rate >= 0.0, "decay rate must be non-negative, got {rate}");
        self.default_rate = rate;
        self
    }

    /// Effective rate for a type: override, else the type's built-in rate.
    #[must_use]
    pub fn rate_for(&self, memory_type: MemoryType) -> f64 {
        self.overrides
            .get(&memory_type)
            .copied()
            .unwrap_or_else(|| memory_type.decay_rate())
    }

    /// Fallback rate for callers without a type in hand.
    #[must_use]
    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }
}

// =============================================================================
// DecayCalculator
// =============================================================================

/// Computes fresh decay factors. Pure except for reading the clock; the
/// time-parameterized form exists so tests never sleep.
#[derive(Debug, Clone, Default)]
pub struct DecayCalculator {
    rates: DecayRates,
}

impl DecayCalculator {
    /// Calculator with built-in per-type rates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculator with a custom rate table.
    #[must_use]
    pub fn with_rates(rates: DecayRates) -> Self {
        Self { rates }
    }

    /// The rate table in use.
    #[must_use]
    pub fn rates(&self) -> &DecayRates {
        &self.rates
    }

    /// Fresh decay factor for a record as of now.
    #[must_use]
    pub fn calculate(&self, record: &MemoryRecord) -> f64 {
        self.calculate_at(record, Utc::now())
    }

    /// Fresh decay factor for a record as of `now`.
    ///
    /// Returns 1.0 when the record has no last access. Elapsed time counts
    /// whole days only, so same-day recalls see no decay.
    #[must_use]
    pub fn calculate_at(&self, record: &MemoryRecord, now: DateTime<Utc>) -> f64 {
        let Some(last_accessed) = record.last_accessed_at else {
            return 1.0;
        };

        let days = now.signed_duration_since(last_accessed).num_days().max(0);
        let rate = self.rates.rate_for(record.memory_type);
        let decay = (-rate * days as f64).exp();

        // Postcondition
        assert!((0.0..=1.0).contains(&decay), "decay must be in [0, 1]");
        decay
    }

    /// Whether a record's fresh decay factor is below the threshold.
    #[must_use]
    pub fn is_expired(&self, record: &MemoryRecord, threshold: f64) -> bool {
        // Precondition
        assert!((0.0..=1.0).contains(&threshold), "threshold must be in [0, 1]");
        self.calculate(record) < threshold
    }
}

// =============================================================================
// Tests
// =============================================================================
