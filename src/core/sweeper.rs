//! Periodic maintenance task.
//!
//! Expiry stays lazy at read time; this task only bounds memory by dropping
//! expired counters and long-idle suspicion entries on a fixed interval. It
//! is owned explicitly: spawned at process initialization and aborted at
//! shutdown, never an ambient timer.

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::core::memory_store::MemoryStore;
use crate::core::suspicion::SuspicionScorer;
use crate::models::SweepConfig;

/// Handle to the background sweep task
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Start sweeping on `config.interval_seconds`.
    ///
    /// `store` is `None` when the networked backend is in use; Redis expires
    /// its own keys, so only suspicion entries need sweeping there.
    pub fn spawn(
        store: Option<Arc<MemoryStore>>,
        scorer: Arc<SuspicionScorer>,
        config: SweepConfig,
    ) -> Self {
        let interval = Duration::from_secs(config.interval_seconds.max(1));
        let idle = Duration::from_secs(config.suspicion_idle_seconds);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so a fresh
            // process doesn't sweep an empty map.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let counters = store.as_ref().map(|s| s.sweep()).unwrap_or(0);
                let identities = scorer.sweep(idle);
                if counters > 0 || identities > 0 {
                    info!(
                        "sweep removed {} expired counters and {} idle identities",
                        counters, identities
                    );
                } else {
                    debug!("sweep found nothing to remove");
                }
            }
        });

        Self { handle }
    }

    /// Stop the task
    pub fn shutdown(self) {
        self.handle.abort();
    }
}
