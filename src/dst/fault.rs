//! `FaultInjector` - Probabilistic Fault Injection
//!
//! `TigerStyle`: Explicit fault injection for chaos testing.
//!
//! The in-memory stores and sim providers consult a shared injector on
//! every operation, so error paths stay reachable from deterministic tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::rng::DeterministicRng;
use crate::constants::DST_FAULT_PROBABILITY_MAX;

/// Types of faults that can be injected.
///
/// `TigerStyle`: Every fault type is explicit and documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    // =========================================================================
    // Storage Faults
    // =========================================================================
    /// Metadata or vector write fails
    StorageWriteFail,
    /// Metadata or vector read fails
    StorageReadFail,
    /// Delete operation fails
    StorageDeleteFail,
    /// Similarity search fails
    VectorSearchFail,

    // =========================================================================
    // LLM Faults
    // =========================================================================
    /// LLM request timeout
    LlmTimeout,
    /// Rate limit exceeded
    LlmRateLimit,
    /// Response is not parseable
    LlmInvalidResponse,
    /// Service unavailable
    LlmServiceUnavailable,

    // =========================================================================
    // Embedding Faults
    // =========================================================================
    /// Embedding request timeout
    EmbeddingTimeout,
    /// Embedding response malformed
    EmbeddingInvalidResponse,
}

impl FaultType {
    /// Get the fault type name as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageWriteFail => "storage_write_fail",
            Self::StorageReadFail => "storage_read_fail",
            Self::StorageDeleteFail => "storage_delete_fail",
            Self::VectorSearchFail => "vector_search_fail",
            Self::LlmTimeout => "llm_timeout",
            Self::LlmRateLimit => "llm_rate_limit",
            Self::LlmInvalidResponse => "llm_invalid_response",
            Self::LlmServiceUnavailable => "llm_service_unavailable",
            Self::EmbeddingTimeout => "embedding_timeout",
            Self::EmbeddingInvalidResponse => "embedding_invalid_response",
        }
    }
}

/// Configuration for a specific fault.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// The type of fault
    pub fault_type: FaultType,
    /// Probability of injection (0.0 to 1.0)
    pub probability: f64,
    /// Optional operation filter (substring match)
    pub operation_filter: Option<String>,
    /// Maximum number of injections (None = unlimited)
    pub max_injections: Option<u64>,
}

impl FaultConfig {
    /// Create a new fault configuration.
    ///
    /// # Panics
    /// Panics if probability is not in [0, 1].
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        // Precondition
        assert!(
            (0.0..=DST_FAULT_PROBABILITY_MAX).contains(&probability),
            "probability must be in [0, {DST_FAULT_PROBABILITY_MAX}], got {probability}"
        );

        Self {
            fault_type,
            probability,
            operation_filter: None,
            max_injections: None,
        }
    }

    /// Set operation filter (fault only applies to matching operations).
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.operation_filter = Some(filter.into());
        self
    }

    /// Set maximum number of injections.
    #[must_use]
    pub fn with_max_injections(mut self, max: u64) -> Self {
        // Precondition
        assert!(max > 0, "max_injections must be positive");
        self.max_injections = Some(max);
        self
    }
}

/// Fault injector for simulation testing.
///
/// `TigerStyle`:
/// - Explicit fault registration
/// - Deterministic through RNG
/// - Interior mutability for sharing via Arc
#[derive(Debug)]
pub struct FaultInjector {
    /// RNG wrapped in Mutex for interior mutability (allows sharing via Arc)
    rng: Mutex<DeterministicRng>,
    configs: Vec<FaultConfig>,
    /// Injection counts per fault type (interior mutability)
    injection_counts: Mutex<HashMap<FaultType, u64>>,
}

impl FaultInjector {
    /// Create a new fault injector with the given RNG.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            configs: Vec::new(),
            injection_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Register a fault configuration.
    ///
    /// Note: Registration must happen before sharing via Arc.
    pub fn register(&mut self, config: FaultConfig) {
        self.injection_counts
            .lock()
            .expect("injection_counts lock poisoned")
            .entry(config.fault_type)
            .or_insert(0);

        self.configs.push(config);
    }

    /// Check if a fault should be injected for the given operation.
    ///
    /// Returns the fault type if one should be injected, None otherwise.
    pub fn should_inject(&self, operation: &str) -> Option<FaultType> {
        for config in &self.configs {
            if let Some(ref filter) = config.operation_filter {
                if !operation.contains(filter) {
                    continue;
                }
            }

            if let Some(max) = config.max_injections {
                let counts = self
                    .injection_counts
                    .lock()
                    .expect("injection_counts lock poisoned");
                let count = counts.get(&config.fault_type).copied().unwrap_or(0);
                if count >= max {
                    continue;
                }
            }

            let should_inject = {
                let mut rng = self.rng.lock().expect("rng lock poisoned");
                rng.next_bool(config.probability)
            };

            if should_inject {
                let mut counts = self
                    .injection_counts
                    .lock()
                    .expect("injection_counts lock poisoned");
                if let Some(count) = counts.get_mut(&config.fault_type) {
                    *count += 1;
                }

                return Some(config.fault_type);
            }
        }

        None
    }

    /// Get total number of injections.
    #[must_use]
    pub fn total_injections(&self) -> u64 {
        self.injection_counts
            .lock()
            .expect("injection_counts lock poisoned")
            .values()
            .sum()
    }

    /// Reset all statistics.
    pub fn reset_stats(&self) {
        let mut counts = self
            .injection_counts
            .lock()
            .expect("injection_counts lock poisoned");
        for count in counts.values_mut() {
            *count = 0;
        }
    }
}
