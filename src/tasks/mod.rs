//! Background Tasks Module
//!
//! Long-lived maintenance loops that run alongside request handling.
//!
//! # Tasks
//! - Warmup: refreshes keys the predictor expects to be read soon
//! - Expiry sweep: removes expired local-tier entries
//! - Stats: logs and publishes counter snapshots

mod report;
mod sweep;
mod warmup;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{CacheStats, TieredCache};
use crate::config::Config;

pub use report::spawn_stats_task;
pub use sweep::spawn_sweep_task;
pub use warmup::spawn_warmup_task;

// == Maintenance Handle ==
/// Handles to the three maintenance loops.
pub struct MaintenanceHandle {
    warmup: JoinHandle<()>,
    sweep: JoinHandle<()>,
    stats: JoinHandle<()>,
    latest_stats: watch::Receiver<CacheStats>,
}

impl MaintenanceHandle {
    /// Receiver for the snapshots published by the stats loop.
    pub fn stats_receiver(&self) -> watch::Receiver<CacheStats> {
        self.latest_stats.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.warmup.is_finished() && self.sweep.is_finished() && self.stats.is_finished()
    }

    /// Stops all loops and waits for them to wind down.
    pub async fn shutdown(self) {
        self.warmup.abort();
        self.sweep.abort();
        self.stats.abort();

        // Aborted tasks resolve with a cancellation error
        let _ = self.warmup.await;
        let _ = self.sweep.await;
        let _ = self.stats.await;
        info!("Maintenance tasks stopped");
    }
}

/// Starts the warmup, expiry sweep and stats loops for `cache`.
pub fn spawn_maintenance(cache: Arc<TieredCache>, config: &Config) -> MaintenanceHandle {
    let (tx, rx) = watch::channel(cache.stats());

    MaintenanceHandle {
        warmup: spawn_warmup_task(cache.clone(), config.warmup_interval()),
        sweep: spawn_sweep_task(cache.clone(), config.sweep_interval()),
        stats: spawn_stats_task(cache, config.stats_interval(), tx),
        latest_stats: rx,
    }
}
