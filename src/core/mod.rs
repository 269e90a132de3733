//! Core functionality for the rate governance service.
//!
//! This module contains the core components of the subsystem: counter
//! storage, identity derivation, window policy enforcement, suspicion
//! scoring and the heuristic classifier.

pub mod governor;
pub mod heuristics;
pub mod identity;
pub mod memory_store;
pub mod policies;
pub mod redis_store;
pub mod store;
pub mod suspicion;
pub mod sweeper;
pub mod window;

pub use governor::RateGovernor;
pub use heuristics::looks_automated;
pub use identity::{derive_identity, UNKNOWN_IDENTITY};
pub use memory_store::MemoryStore;
pub use policies::{PolicyError, PolicyTable};
pub use redis_store::RedisStore;
pub use store::{CounterRecord, CounterStore, StoreError};
pub use suspicion::SuspicionScorer;
pub use sweeper::Sweeper;
pub use window::WindowPolicyEngine;
