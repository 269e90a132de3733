//! Configuration management for the rate governance service.
//!
//! Loads application configuration from an optional TOML file and
//! environment variables, with defaults for every setting.

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use std::env;

use crate::models::Config;

/// Load configuration from the file named by `CONFIG_FILE` (if present)
/// and the environment
pub fn load_config() -> Result<Config, ConfigError> {
    let config_file = env::var("CONFIG_FILE").unwrap_or_else(|_| "config/default.toml".to_string());

    let config = ConfigBuilder::builder()
        .add_source(File::with_name(&config_file).required(false))
        .add_source(Environment::default().separator("__"))
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("store_backend", "memory")?
        .set_default("redis.url", "redis://127.0.0.1:6379")?
        .set_default("redis.operation_timeout_ms", 250)?
        .set_default("sweep.interval_seconds", 300)?
        .set_default("sweep.suspicion_idle_seconds", 86_400)?
        .build()?;

    config.try_deserialize()
}
