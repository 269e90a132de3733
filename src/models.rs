use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Logical route categories that share one window/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCategory {
    /// General API traffic
    General,
    /// Authentication attempts
    Auth,
    /// Public contact-form submissions
    Contact,
    /// File uploads
    Upload,
    /// Administrative actions
    Admin,
    /// Search queries
    Search,
    /// Credential-reset requests
    PasswordReset,
}

impl PolicyCategory {
    pub const ALL: [PolicyCategory; 7] = [
        PolicyCategory::General,
        PolicyCategory::Auth,
        PolicyCategory::Contact,
        PolicyCategory::Upload,
        PolicyCategory::Admin,
        PolicyCategory::Search,
        PolicyCategory::PasswordReset,
    ];

    /// Stable label used in counter keys and configuration
    pub fn label(&self) -> &'static str {
        match self {
            PolicyCategory::General => "general",
            PolicyCategory::Auth => "auth",
            PolicyCategory::Contact => "contact",
            PolicyCategory::Upload => "upload",
            PolicyCategory::Admin => "admin",
            PolicyCategory::Search => "search",
            PolicyCategory::PasswordReset => "password_reset",
        }
    }
}

/// Window/limit pair applied to one policy category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Human-readable policy label
    pub label: String,
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Maximum requests allowed per window
    pub max_requests: u32,
}

impl Policy {
    pub fn new(label: impl Into<String>, window_ms: u64, max_requests: u32) -> Self {
        Self {
            label: label.into(),
            window_ms,
            max_requests,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Outcome of one rate-governance evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Limit in force for this evaluation
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset_at: DateTime<Utc>,
    /// Seconds until a denied client should retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Request details the governor consumes: forwarding headers and the
/// declared client software
#[derive(Debug, Clone, Default)]
pub struct RequestMetadata {
    pub forwarded_for: Option<String>,
    pub real_ip: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
    pub accept_language: Option<String>,
}

/// Counter store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
    /// Upper bound on a single store operation, in milliseconds
    pub operation_timeout_ms: u64,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

/// Background sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep passes
    pub interval_seconds: u64,
    /// Suspicion entries idle longer than this are dropped, in seconds
    pub suspicion_idle_seconds: u64,
}

/// Per-category override of the built-in limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitOverride {
    pub window_ms: Option<u64>,
    pub max_requests: Option<u32>,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Which counter store backend to use
    pub store_backend: StoreBackend,
    /// Redis configuration (used when `store_backend` is `redis`)
    pub redis: RedisConfig,
    /// Background sweep configuration
    pub sweep: SweepConfig,
    /// Per-category limit overrides, keyed by category label
    #[serde(default)]
    pub limits: HashMap<String, LimitOverride>,
}
