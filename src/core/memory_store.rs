//! In-process counter store for single-instance deployments.
//!
//! Backed by a sharded concurrent map; the map's entry API holds the shard
//! write lock while a counter is created or incremented, which makes the
//! increment-and-fetch atomic per key. Expiry is lazy: a record whose window
//! has elapsed is treated as absent on the next increment. The periodic
//! sweep only bounds memory.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

use crate::core::store::{CounterRecord, CounterStore, StoreError};
use crate::utils::now_millis;

#[derive(Debug, Clone, Copy)]
struct CounterSlot {
    count: u64,
    window_reset_at: u64,
}

/// Concurrent-safe in-process counter store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CounterSlot>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Remove entries whose window has elapsed, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let now = now_millis();
        let before = self.entries.len();
        self.entries.retain(|_, slot| now < slot.window_reset_at);
        before.saturating_sub(self.entries.len())
    }

    /// Number of tracked keys, live or expired
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterRecord, StoreError> {
        let now = now_millis();
        let window_ms = window.as_millis() as u64;

        // The entry guard serializes concurrent updates to the same key.
        let mut slot = self
            .entries
            .entry(key.to_string())
            .or_insert(CounterSlot {
                count: 0,
                window_reset_at: now + window_ms,
            });

        if now >= slot.window_reset_at {
            slot.count = 1;
            slot.window_reset_at = now + window_ms;
        } else {
            slot.count += 1;
        }

        Ok(CounterRecord {
            key: key.to_string(),
            count: slot.count,
            window_reset_at: slot.window_reset_at,
        })
    }

    async fn reset(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
