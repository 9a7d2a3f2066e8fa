//! Deterministic Simulation Testing (DST)
//!
//! `TigerStyle`: All nondeterminism in tests flows through a seeded RNG,
//! and every external failure mode is injectable.

mod fault;
mod rng;

pub use fault::{FaultConfig, FaultInjector, FaultType};
pub use rng::DeterministicRng;
