//! Rate Governance Service
//!
//! This is the main entry point for the rate governance service.
//! It initializes the application components and starts the web server.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::sync::Arc;
use std::time::Duration;

use rate_governor::api::{self, ApiState};
use rate_governor::config;
use rate_governor::core::{
    CounterStore, MemoryStore, PolicyTable, RateGovernor, RedisStore, Sweeper,
};
use rate_governor::models::StoreBackend;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    info!("Starting rate governance service...");

    // Load configuration
    let config = config::load_config().context("Failed to load configuration")?;

    // Build the policy table, validating limits up front
    let policies = PolicyTable::from_overrides(&config.limits)
        .context("Invalid rate limit configuration")?;

    // Select the counter store backend
    let memory_store = match config.store_backend {
        StoreBackend::Memory => Some(Arc::new(MemoryStore::new())),
        StoreBackend::Redis => None,
    };
    let store: Arc<dyn CounterStore> = match &memory_store {
        Some(memory) => {
            info!("Using in-process counter store");
            Arc::clone(memory) as Arc<dyn CounterStore>
        }
        None => {
            info!("Using Redis counter store at {}", config.redis.url);
            let timeout = Duration::from_millis(config.redis.operation_timeout_ms);
            Arc::new(
                RedisStore::connect(&config.redis.url, timeout)
                    .context("Failed to create Redis client")?,
            )
        }
    };

    // Initialize the governor
    let governor = Arc::new(RateGovernor::new(store, policies));

    // Start the background sweep
    let sweeper = Sweeper::spawn(memory_store, governor.scorer(), config.sweep.clone());

    // Create API state
    let state = web::Data::new(ApiState {
        governor: governor.clone(),
    });

    // Start HTTP server
    let result = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::config)
    })
    .bind((config.server.host.as_str(), config.server.port))
    .context("Failed to bind server address")?
    .run()
    .await;

    sweeper.shutdown();
    info!("Rate governance service stopped");

    Ok(result?)
}
