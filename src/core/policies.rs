//! Static policy table mapping route categories to window/limit pairs.

use std::collections::HashMap;
use thiserror::Error;

use crate::models::{LimitOverride, Policy, PolicyCategory};

/// Errors raised while building the policy table at startup
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("unknown policy category '{0}' in limit overrides")]
    UnknownCategory(String),
    #[error("invalid policy for '{category}': {reason}")]
    Invalid {
        category: &'static str,
        reason: String,
    },
}

/// Immutable category-to-policy lookup, fixed at startup
#[derive(Debug, Clone)]
pub struct PolicyTable {
    policies: HashMap<PolicyCategory, Policy>,
}

impl PolicyTable {
    /// Built-in limits: tightest for authentication and credential reset,
    /// loosest for general API traffic.
    pub fn defaults() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            PolicyCategory::General,
            Policy::new("general", 60_000, 120),
        );
        policies.insert(PolicyCategory::Auth, Policy::new("auth", 900_000, 10));
        policies.insert(
            PolicyCategory::Contact,
            Policy::new("contact", 3_600_000, 5),
        );
        policies.insert(PolicyCategory::Upload, Policy::new("upload", 3_600_000, 20));
        policies.insert(PolicyCategory::Admin, Policy::new("admin", 60_000, 30));
        policies.insert(PolicyCategory::Search, Policy::new("search", 60_000, 60));
        policies.insert(
            PolicyCategory::PasswordReset,
            Policy::new("password_reset", 3_600_000, 3),
        );
        Self { policies }
    }

    /// Build the table from configuration overrides, validating every entry
    pub fn from_overrides(
        overrides: &HashMap<String, LimitOverride>,
    ) -> Result<Self, PolicyError> {
        let mut table = Self::defaults();

        for (label, entry) in overrides {
            let category = category_for_label(label)
                .ok_or_else(|| PolicyError::UnknownCategory(label.clone()))?;
            let policy = table
                .policies
                .get_mut(&category)
                .expect("defaults cover every category");
            if let Some(window_ms) = entry.window_ms {
                policy.window_ms = window_ms;
            }
            if let Some(max_requests) = entry.max_requests {
                policy.max_requests = max_requests;
            }
        }

        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        for category in PolicyCategory::ALL {
            let policy = self.policy(category);
            if policy.max_requests == 0 {
                return Err(PolicyError::Invalid {
                    category: category.label(),
                    reason: "max_requests must be at least 1".to_string(),
                });
            }
            if policy.window_ms == 0 {
                return Err(PolicyError::Invalid {
                    category: category.label(),
                    reason: "window_ms must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Base policy for `category`
    pub fn policy(&self, category: PolicyCategory) -> &Policy {
        self.policies
            .get(&category)
            .expect("table holds every category")
    }
}

fn category_for_label(label: &str) -> Option<PolicyCategory> {
    PolicyCategory::ALL
        .into_iter()
        .find(|category| category.label() == label)
}
