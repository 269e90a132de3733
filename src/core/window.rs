//! Fixed-window policy enforcement.
//!
//! Counts requests in discrete, non-overlapping buckets of fixed length.
//! Bursts of up to twice the nominal rate across a window boundary are an
//! accepted characteristic of the algorithm, not a defect.

use log::warn;
use std::sync::Arc;

use crate::core::store::{CounterRecord, CounterStore};
use crate::models::{Decision, Policy};
use crate::utils::{millis_to_datetime, now_millis};

/// Applies a policy to one counter key via the configured store
pub struct WindowPolicyEngine {
    store: Arc<dyn CounterStore>,
}

impl WindowPolicyEngine {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Count this request against `key` and decide whether it may proceed.
    ///
    /// Store failures never surface to the caller: they are logged and
    /// converted into an allow decision.
    pub async fn check_limit(&self, key: &str, policy: &Policy) -> Decision {
        match self.store.increment(key, policy.window()).await {
            Ok(record) => decide(&record, policy),
            Err(e) => {
                warn!("counter store failure for key {}: {}; allowing request", key, e);
                fail_open(policy)
            }
        }
    }

    /// Discard the counter behind `key` (administrative override)
    pub async fn reset(&self, key: &str) {
        if let Err(e) = self.store.reset(key).await {
            warn!("failed to reset counter for key {}: {}", key, e);
        }
    }
}

fn decide(record: &CounterRecord, policy: &Policy) -> Decision {
    let reset_at = millis_to_datetime(record.window_reset_at);

    if record.count > u64::from(policy.max_requests) {
        let now = now_millis();
        let remaining_ms = record.window_reset_at.saturating_sub(now);
        Decision {
            allowed: false,
            limit: policy.max_requests,
            remaining: 0,
            reset_at,
            retry_after_seconds: Some((remaining_ms + 999) / 1000),
        }
    } else {
        let used = record.count as u32;
        Decision {
            allowed: true,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(used),
            reset_at,
            retry_after_seconds: None,
        }
    }
}

fn fail_open(policy: &Policy) -> Decision {
    Decision {
        allowed: true,
        limit: policy.max_requests,
        remaining: policy.max_requests,
        reset_at: millis_to_datetime(now_millis() + policy.window_ms),
        retry_after_seconds: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory_store::MemoryStore;
    use crate::core::store::{MockCounterStore, StoreError};
    use std::time::Duration;

    fn engine_with_memory_store() -> WindowPolicyEngine {
        WindowPolicyEngine::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn remaining_decreases_then_denies_past_the_limit() {
        let engine = engine_with_memory_store();
        let policy = Policy::new("contact", 60_000, 3);

        for expected_remaining in [2, 1, 0] {
            let decision = engine.check_limit("203.0.113.5:contact", &policy).await;
            assert!(decision.allowed);
            assert_eq!(decision.limit, 3);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let denied = engine.check_limit("203.0.113.5:contact", &policy).await;
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        let retry = denied.retry_after_seconds.unwrap();
        assert!(retry >= 59 && retry <= 60, "retry_after was {}", retry);
    }

    #[tokio::test]
    async fn new_window_allows_again() {
        let engine = engine_with_memory_store();
        let policy = Policy::new("contact", 300, 3);

        for _ in 0..3 {
            assert!(engine.check_limit("203.0.113.5:contact", &policy).await.allowed);
        }
        assert!(!engine.check_limit("203.0.113.5:contact", &policy).await.allowed);

        tokio::time::sleep(Duration::from_millis(350)).await;

        let fresh = engine.check_limit("203.0.113.5:contact", &policy).await;
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 2);
    }

    #[tokio::test]
    async fn store_timeout_fails_open() {
        let mut store = MockCounterStore::new();
        store
            .expect_increment()
            .returning(|_, _| Err(StoreError::Timeout(Duration::from_millis(250))));

        let engine = WindowPolicyEngine::new(Arc::new(store));
        let policy = Policy::new("auth", 900_000, 10);

        let decision = engine.check_limit("203.0.113.5:auth", &policy).await;
        assert!(decision.allowed);
        assert!(decision.retry_after_seconds.is_none());
    }

    #[tokio::test]
    async fn store_reset_failure_is_swallowed() {
        let mut store = MockCounterStore::new();
        store
            .expect_reset()
            .returning(|_| Err(StoreError::Timeout(Duration::from_millis(250))));

        let engine = WindowPolicyEngine::new(Arc::new(store));
        engine.reset("203.0.113.5:auth").await;
    }
}
