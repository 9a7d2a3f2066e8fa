//! Engine Configuration
//!
//! `TigerStyle`: Every knob has a validated range and a documented default.

use crate::constants::{
    CONTEXT_MEMORY_BUDGET_RATIO_DEFAULT, DECAY_SWEEP_THRESHOLD_DEFAULT,
    EXTRACTION_BUFFER_TOKENS_DEFAULT, EXTRACTION_BUFFER_TURNS_DEFAULT,
    EXTRACTION_MESSAGE_TOKENS_MAX_DEFAULT, EXTRACTION_TURNS_PER_CHUNK_DEFAULT,
    RECALL_RESULTS_COUNT_DEFAULT, RECALL_RESULTS_COUNT_MAX,
};

/// Configuration for [`crate::MemoryEngine`].
///
/// # Example
///
/// ```rust
/// use engram::MemoryConfig;
///
/// let config = MemoryConfig::default()
///     .with_max_buffer_turns(4)
///     .with_async_extraction(false);
/// assert_eq!(config.max_buffer_turns, 4);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Buffered user turns that trigger an extraction
    pub max_buffer_turns: usize,
    /// Buffered tokens that trigger an extraction
    pub max_buffer_tokens: usize,
    /// Maximum user turns per extraction chunk
    pub max_turns_per_extraction: usize,
    /// Per-message token cap before transcript truncation
    pub max_tokens_per_message: usize,
    /// Run triggered extractions on a background task
    pub async_extraction: bool,
    /// Run a final extraction pass when a session ends
    pub extract_on_session_end: bool,
    /// Apply time decay during recall and sweeps
    pub enable_decay: bool,
    /// Fraction of model context granted to recalled memories
    pub memory_budget_ratio: f64,
    /// Maximum records returned by recall
    pub max_recall_records: usize,
    /// Decay threshold below which a sweep deletes records
    pub decay_sweep_threshold: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_buffer_turns: EXTRACTION_BUFFER_TURNS_DEFAULT,
            max_buffer_tokens: EXTRACTION_BUFFER_TOKENS_DEFAULT,
            max_turns_per_extraction: EXTRACTION_TURNS_PER_CHUNK_DEFAULT,
            max_tokens_per_message: EXTRACTION_MESSAGE_TOKENS_MAX_DEFAULT,
            async_extraction: true,
            extract_on_session_end: true,
            enable_decay: true,
            memory_budget_ratio: CONTEXT_MEMORY_BUDGET_RATIO_DEFAULT,
            max_recall_records: RECALL_RESULTS_COUNT_DEFAULT,
            decay_sweep_threshold: DECAY_SWEEP_THRESHOLD_DEFAULT,
        }
    }
}

impl MemoryConfig {
    /// Set the user-turn extraction trigger.
    ///
    /// # Panics
    /// Panics if zero.
    #[must_use]
    pub fn with_max_buffer_turns(mut self, turns: usize) -> Self {
        assert!(turns > 0, "max_buffer_turns must be positive");
        self.max_buffer_turns = turns;
        self
    }

    /// Set the token extraction trigger.
    ///
    /// # Panics
    /// Panics if zero.
    #[must_use]
    pub fn with_max_buffer_tokens(mut self, tokens: usize) -> Self {
        assert!(tokens > 0, "max_buffer_tokens must be positive");
        self.max_buffer_tokens = tokens;
        self
    }

    /// Set the per-chunk user-turn cap.
    ///
    /// # Panics
    /// Panics if zero.
    #[must_use]
    pub fn with_max_turns_per_extraction(mut self, turns: usize) -> Self {
        assert!(turns > 0, "max_turns_per_extraction must be positive");
        self.max_turns_per_extraction = turns;
        self
    }

    /// Set the per-message token cap.
    ///
    /// # Panics
    /// Panics if zero.
    #[must_use]
    pub fn with_max_tokens_per_message(mut self, tokens: usize) -> Self {
        assert!(tokens > 0, "max_tokens_per_message must be positive");
        self.max_tokens_per_message = tokens;
        self
    }

    /// Toggle background extraction.
    #[must_use]
    pub fn with_async_extraction(mut self, enabled: bool) -> Self {
        self.async_extraction = enabled;
        self
    }

    /// Toggle the session-end extraction pass.
    #[must_use]
    pub fn with_extract_on_session_end(mut self, enabled: bool) -> Self {
        self.extract_on_session_end = enabled;
        self
    }

    /// Toggle time decay.
    #[must_use]
    pub fn with_enable_decay(mut self, enabled: bool) -> Self {
        self.enable_decay = enabled;
        self
    }

    /// Set the recalled-memory context budget ratio.
    ///
    /// # Panics
    /// Panics if the ratio is outside (0, 1].
    #[must_use]
    pub fn with_memory_budget_ratio(mut self, ratio: f64) -> Self {
        assert!(
            ratio > 0.0 && ratio <= 1.0,
            "memory_budget_ratio must be in (0, 1], got {ratio}"
        );
        self.memory_budget_ratio = ratio;
        self
    }

    /// Set the recall result cap.
    ///
    /// # Panics
    /// Panics if zero or above the hard limit.
    #[must_use]
    pub fn with_max_recall_records(mut self, records: usize) -> Self {
        assert!(
            (1..=RECALL_RESULTS_COUNT_MAX).contains(&records),
            "max_recall_records must be in [1, {RECALL_RESULTS_COUNT_MAX}]"
        );
        self.max_recall_records = records;
        self
    }

    /// Set the sweep deletion threshold.
    ///
    /// # Panics
    /// Panics if the threshold is outside [0, 1].
    #[must_use]
    pub fn with_decay_sweep_threshold(mut self, threshold: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "decay_sweep_threshold must be in [0, 1]"
        );
        self.decay_sweep_threshold = threshold;
        self
    }
}
