//! Networked counter store for multi-instance deployments.
//!
//! Delegates to Redis so that several host processes share one counter
//! space. Atomicity comes from Redis's native INCR; window expiry from
//! PEXPIRE. Every operation is bounded by a timeout, after which it is
//! reported as a store error and the engine layer fails open.

use async_trait::async_trait;
use log::warn;
use redis::AsyncCommands;
use std::time::Duration;

use crate::core::store::{CounterRecord, CounterStore, StoreError};
use crate::utils::now_millis;

/// Redis-backed counter store
pub struct RedisStore {
    client: redis::Client,
    operation_timeout: Duration,
}

impl RedisStore {
    /// Create a store from an already-opened client
    pub fn new(client: redis::Client, operation_timeout: Duration) -> Self {
        Self {
            client,
            operation_timeout,
        }
    }

    /// Open a client for `url`
    pub fn connect(url: &str, operation_timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        Ok(Self::new(client, operation_timeout))
    }

    async fn increment_inner(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<CounterRecord, StoreError> {
        let mut conn = self.client.get_async_connection().await?;
        let window_ms = window.as_millis() as usize;

        let count: u64 = match conn.incr(key, 1u64).await {
            Ok(count) => count,
            // A value that cannot be incremented is a corrupt record: drop
            // it and start a fresh window.
            Err(e) if is_corrupt_value(&e) => {
                warn!("dropping corrupt counter record for key {}: {}", key, e);
                let _: () = conn.del(key).await?;
                conn.incr(key, 1u64).await?
            }
            Err(e) => return Err(e.into()),
        };

        let now = now_millis();
        let window_reset_at = if count == 1 {
            let _: () = conn.pexpire(key, window_ms).await?;
            now + window_ms as u64
        } else {
            let ttl_ms: i64 = conn.pttl(key).await?;
            if ttl_ms < 0 {
                // The key lost its expiry (e.g. a crash between INCR and
                // PEXPIRE); re-arm the window.
                let _: () = conn.pexpire(key, window_ms).await?;
                now + window_ms as u64
            } else {
                now + ttl_ms as u64
            }
        };

        Ok(CounterRecord {
            key: key.to_string(),
            count,
            window_reset_at,
        })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterRecord, StoreError> {
        match tokio::time::timeout(self.operation_timeout, self.increment_inner(key, window)).await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.operation_timeout)),
        }
    }

    async fn reset(&self, key: &str) -> Result<(), StoreError> {
        let delete = async {
            let mut conn = self.client.get_async_connection().await?;
            let _: () = conn.del(key).await?;
            Ok(())
        };
        match tokio::time::timeout(self.operation_timeout, delete).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.operation_timeout)),
        }
    }
}

/// Whether a Redis error indicates an unusable stored value rather than a
/// connectivity problem
fn is_corrupt_value(e: &redis::RedisError) -> bool {
    matches!(
        e.kind(),
        redis::ErrorKind::TypeError | redis::ErrorKind::ResponseError
    )
}
