//! Warmup Task
//!
//! Background task that asks the predictor which popular keys are due soon
//! and refreshes them through the cache's refresh provider, if one is set.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TieredCache;

/// Spawns the warmup loop, running one pass every `interval`.
///
/// Passes run on their own task, so a slow refresh provider delays only the
/// next pass, never foreground lookups.
pub fn spawn_warmup_task(cache: Arc<TieredCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting warmup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let report = cache.run_warmup().await;

            if report.predicted > 0 {
                info!(
                    examined = report.examined,
                    predicted = report.predicted,
                    refreshed = report.refreshed,
                    "Warmup pass complete"
                );
            } else {
                debug!(examined = report.examined, "Warmup pass: no keys predicted");
            }
        }
    })
}
