//! Counter storage abstraction for the rate governance service.
//!
//! A counter store holds one live request count per key, expiring each count
//! at the end of its fixed window. Implementations must make increment-and-fetch
//! atomic with respect to concurrent callers using the same key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during counter store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// One key's live request count and window expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Counter key (client identity combined with a policy category)
    pub key: String,
    /// Requests observed in the current window, starting at 1
    pub count: u64,
    /// Unix-millisecond timestamp at which the window resets
    pub window_reset_at: u64,
}

/// Pluggable per-key request counter with TTL-based expiry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the live counter for `key` and return the updated record.
    ///
    /// When no live record exists (none was ever created, or the existing
    /// one's window has elapsed) a fresh record is created with count 1 and
    /// a reset time of now + `window`. Two concurrent callers for the same
    /// key never both observe count 1.
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterRecord, StoreError>;

    /// Discard the counter for `key`, if any
    async fn reset(&self, key: &str) -> Result<(), StoreError>;
}
