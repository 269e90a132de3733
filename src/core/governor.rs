//! Request-rate governance orchestration.
//!
//! Ties the pieces together for one evaluation: derive the client identity,
//! tighten the policy by suspicion level, count the request against the
//! window engine, then feed the outcome back into the scorer.

use log::debug;
use std::sync::Arc;

use crate::core::identity::derive_identity;
use crate::core::policies::PolicyTable;
use crate::core::store::CounterStore;
use crate::core::suspicion::SuspicionScorer;
use crate::core::window::WindowPolicyEngine;
use crate::models::{Decision, PolicyCategory, RequestMetadata};
use crate::utils::format_counter_key;

/// The rate-governance subsystem's entry point
pub struct RateGovernor {
    engine: WindowPolicyEngine,
    scorer: Arc<SuspicionScorer>,
    policies: PolicyTable,
}

impl RateGovernor {
    pub fn new(store: Arc<dyn CounterStore>, policies: PolicyTable) -> Self {
        Self {
            engine: WindowPolicyEngine::new(store),
            scorer: Arc::new(SuspicionScorer::new()),
            policies,
        }
    }

    /// Evaluate one inbound request against the policy for `category`
    pub async fn evaluate(&self, meta: &RequestMetadata, category: PolicyCategory) -> Decision {
        let identity = derive_identity(meta);
        let base = self.policies.policy(category);
        let policy = self.scorer.effective_policy(&identity, base);
        let key = format_counter_key(&identity, category.label());

        let decision = self.engine.check_limit(&key, &policy).await;
        self.scorer.record_outcome(&identity, decision.allowed);

        debug!(
            "evaluated {} against {}: allowed={} remaining={} suspicion={:.1}",
            identity,
            policy.label,
            decision.allowed,
            decision.remaining,
            self.scorer.suspicion_level(&identity)
        );

        decision
    }

    /// Administrative override: clear the counter for one identity+category
    pub async fn reset_counter(&self, identity: &str, category: PolicyCategory) {
        let key = format_counter_key(identity, category.label());
        self.engine.reset(&key).await;
    }

    /// Scorer handle for observability surfaces and the background sweep
    pub fn scorer(&self) -> Arc<SuspicionScorer> {
        Arc::clone(&self.scorer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory_store::MemoryStore;

    fn governor() -> RateGovernor {
        RateGovernor::new(Arc::new(MemoryStore::new()), PolicyTable::defaults())
    }

    fn meta_for(addr: &str) -> RequestMetadata {
        RequestMetadata {
            forwarded_for: Some(addr.to_string()),
            ..RequestMetadata::default()
        }
    }

    #[tokio::test]
    async fn contact_form_scenario() {
        let governor = governor();
        let meta = meta_for("203.0.113.5");

        // Contact default is 5 per hour; the first five pass with a
        // decreasing remaining count.
        for expected_remaining in [4, 3, 2, 1, 0] {
            let decision = governor.evaluate(&meta, PolicyCategory::Contact).await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let denied = governor.evaluate(&meta, PolicyCategory::Contact).await;
        assert!(!denied.allowed);
        assert!(denied.retry_after_seconds.is_some());
    }

    #[tokio::test]
    async fn categories_count_independently() {
        let governor = governor();
        let meta = meta_for("203.0.113.5");

        for _ in 0..5 {
            governor.evaluate(&meta, PolicyCategory::Contact).await;
        }
        assert!(!governor.evaluate(&meta, PolicyCategory::Contact).await.allowed);

        // Same identity, different category: its own counter.
        let search = governor.evaluate(&meta, PolicyCategory::Search).await;
        assert!(search.allowed);
        assert_eq!(search.remaining, 59);
    }

    #[tokio::test]
    async fn repeat_offender_faces_a_tighter_ceiling() {
        let governor = governor();
        let meta = meta_for("198.51.100.7");

        // Exhaust the contact window, then keep hammering until six denials
        // have accumulated.
        for _ in 0..11 {
            governor.evaluate(&meta, PolicyCategory::Contact).await;
        }
        assert!(governor.scorer().suspicion_level("198.51.100.7") > 5.0);

        // The same identity now sees a quartered ceiling in other categories
        // too: search drops from 60 to 15.
        let decision = governor.evaluate(&meta, PolicyCategory::Search).await;
        assert_eq!(decision.limit, 15);
    }

    #[tokio::test]
    async fn reset_counter_reopens_the_window() {
        let governor = governor();
        let meta = meta_for("203.0.113.5");

        for _ in 0..5 {
            governor.evaluate(&meta, PolicyCategory::Contact).await;
        }
        assert!(!governor.evaluate(&meta, PolicyCategory::Contact).await.allowed);

        governor
            .reset_counter("203.0.113.5", PolicyCategory::Contact)
            .await;
        governor.scorer().reset_suspicion("203.0.113.5");

        let decision = governor.evaluate(&meta, PolicyCategory::Contact).await;
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn unknown_clients_share_one_counter() {
        let governor = governor();
        let anonymous = RequestMetadata::default();

        let first = governor.evaluate(&anonymous, PolicyCategory::Upload).await;
        let second = governor.evaluate(&anonymous, PolicyCategory::Upload).await;
        assert_eq!(first.remaining, 19);
        assert_eq!(second.remaining, 18);
    }

    #[tokio::test]
    async fn decay_requires_many_clean_requests() {
        let governor = governor();
        let meta = meta_for("192.0.2.9");

        for _ in 0..7 {
            governor.evaluate(&meta, PolicyCategory::Contact).await;
        }
        let after_denials = governor.scorer().suspicion_level("192.0.2.9");
        assert!(after_denials >= 2.0);

        for _ in 0..10 {
            governor.evaluate(&meta, PolicyCategory::General).await;
        }
        let after_recovery = governor.scorer().suspicion_level("192.0.2.9");
        assert!(after_recovery < after_denials);
        assert!(after_recovery > 0.0);
    }
}
