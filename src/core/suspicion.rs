//! Per-client suspicion scoring.
//!
//! Each identity carries a decaying reputation score: denials raise it,
//! allowed requests lower it toward zero. High scores tighten the effective
//! policy before the window engine runs, so repeat offenders face smaller
//! ceilings while clean clients recover gradually.

use dashmap::DashMap;
use std::cmp;
use std::time::Duration;

use crate::models::Policy;
use crate::utils::now_millis;

/// Score subtracted per allowed request. Tunable; raising it makes clients
/// recover faster.
pub const DECAY_PER_ALLOWED: f64 = 0.1;

/// Score added per denied request
pub const PENALTY_PER_DENIAL: f64 = 1.0;

/// At or above this score the limit is halved
pub const TIGHTEN_THRESHOLD: f64 = 2.0;

/// Above this score the limit is quartered and the window doubled
pub const CLAMP_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
struct SuspicionEntry {
    level: f64,
    last_seen: u64,
}

/// Tracks suspicion levels for every observed client identity
#[derive(Debug, Default)]
pub struct SuspicionScorer {
    entries: DashMap<String, SuspicionEntry>,
}

impl SuspicionScorer {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fold one decision outcome into the identity's score
    pub fn record_outcome(&self, identity: &str, allowed: bool) {
        let mut entry = self
            .entries
            .entry(identity.to_string())
            .or_insert(SuspicionEntry {
                level: 0.0,
                last_seen: 0,
            });

        if allowed {
            entry.level = (entry.level - DECAY_PER_ALLOWED).max(0.0);
        } else {
            entry.level += PENALTY_PER_DENIAL;
        }
        entry.last_seen = now_millis();
    }

    /// Derive the policy the window engine should enforce for `identity`.
    ///
    /// Escalation never raises a limit above the base policy's.
    pub fn effective_policy(&self, identity: &str, base: &Policy) -> Policy {
        let level = self.suspicion_level(identity);

        if level > CLAMP_THRESHOLD {
            Policy {
                label: base.label.clone(),
                window_ms: base.window_ms.saturating_mul(2),
                max_requests: cmp::max(1, base.max_requests / 4),
            }
        } else if level >= TIGHTEN_THRESHOLD {
            Policy {
                label: base.label.clone(),
                window_ms: base.window_ms,
                max_requests: cmp::min(base.max_requests, cmp::max(5, base.max_requests / 2)),
            }
        } else {
            base.clone()
        }
    }

    /// Current score for `identity`; 0 when never observed
    pub fn suspicion_level(&self, identity: &str) -> f64 {
        self.entries
            .get(identity)
            .map(|entry| entry.level)
            .unwrap_or(0.0)
    }

    /// Administrative override: forget everything about `identity`
    pub fn reset_suspicion(&self, identity: &str) {
        self.entries.remove(identity);
    }

    /// Drop identities not seen for `idle`, returning how many were removed
    pub fn sweep(&self, idle: Duration) -> usize {
        let cutoff = now_millis().saturating_sub(idle.as_millis() as u64);
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.last_seen >= cutoff);
        before.saturating_sub(self.entries.len())
    }

    /// Number of tracked identities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_policy() -> Policy {
        Policy::new("general", 60_000, 120)
    }

    #[test]
    fn level_never_goes_negative() {
        let scorer = SuspicionScorer::new();
        for _ in 0..20 {
            scorer.record_outcome("1.2.3.4", true);
        }
        assert_eq!(scorer.suspicion_level("1.2.3.4"), 0.0);
    }

    #[test]
    fn denials_raise_and_allowed_requests_decay() {
        let scorer = SuspicionScorer::new();
        scorer.record_outcome("1.2.3.4", false);
        scorer.record_outcome("1.2.3.4", false);
        assert_eq!(scorer.suspicion_level("1.2.3.4"), 2.0);

        scorer.record_outcome("1.2.3.4", true);
        assert!((scorer.suspicion_level("1.2.3.4") - 1.9).abs() < 1e-9);
    }

    #[test]
    fn clean_identity_keeps_the_base_policy() {
        let scorer = SuspicionScorer::new();
        let base = base_policy();
        assert_eq!(scorer.effective_policy("1.2.3.4", &base), base);
    }

    #[test]
    fn mid_level_halves_the_limit() {
        let scorer = SuspicionScorer::new();
        scorer.record_outcome("1.2.3.4", false);
        scorer.record_outcome("1.2.3.4", false);

        let effective = scorer.effective_policy("1.2.3.4", &base_policy());
        assert_eq!(effective.max_requests, 60);
        assert_eq!(effective.window_ms, 60_000);
    }

    #[test]
    fn six_denials_quarter_the_limit_and_double_the_window() {
        let scorer = SuspicionScorer::new();
        for _ in 0..6 {
            scorer.record_outcome("1.2.3.4", false);
        }

        let base = base_policy();
        let effective = scorer.effective_policy("1.2.3.4", &base);
        assert_eq!(effective.max_requests, 30);
        assert!(effective.max_requests < base.max_requests);
        assert_eq!(effective.window_ms, 120_000);
    }

    #[test]
    fn tightening_never_raises_a_small_limit() {
        let scorer = SuspicionScorer::new();
        scorer.record_outcome("1.2.3.4", false);
        scorer.record_outcome("1.2.3.4", false);

        let tight_base = Policy::new("password_reset", 3_600_000, 3);
        let effective = scorer.effective_policy("1.2.3.4", &tight_base);
        assert_eq!(effective.max_requests, 3);
    }

    #[test]
    fn quartered_limit_bottoms_out_at_one() {
        let scorer = SuspicionScorer::new();
        for _ in 0..6 {
            scorer.record_outcome("1.2.3.4", false);
        }

        let tight_base = Policy::new("password_reset", 3_600_000, 3);
        let effective = scorer.effective_policy("1.2.3.4", &tight_base);
        assert_eq!(effective.max_requests, 1);
    }

    #[test]
    fn reset_clears_the_identity() {
        let scorer = SuspicionScorer::new();
        for _ in 0..6 {
            scorer.record_outcome("1.2.3.4", false);
        }
        scorer.reset_suspicion("1.2.3.4");

        assert_eq!(scorer.suspicion_level("1.2.3.4"), 0.0);
        let base = base_policy();
        assert_eq!(scorer.effective_policy("1.2.3.4", &base), base);
    }

    #[test]
    fn sweep_drops_idle_identities_only() {
        let scorer = SuspicionScorer::new();
        scorer.record_outcome("1.2.3.4", false);

        assert_eq!(scorer.sweep(Duration::from_secs(60)), 0);
        assert_eq!(scorer.len(), 1);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(scorer.sweep(Duration::from_millis(5)), 1);
        assert!(scorer.is_empty());
    }
}
