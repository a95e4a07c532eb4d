//! Statistics Report Task
//!
//! Background task that periodically logs a snapshot of the cache counters.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{CacheStats, TieredCache};

/// Spawns the stats loop, logging a snapshot every `interval`.
///
/// Every snapshot is also published on `latest`, so reporting code can read
/// the most recent one without touching the cache. The loop never mutates
/// cache state.
pub fn spawn_stats_task(
    cache: Arc<TieredCache>,
    interval: Duration,
    latest: watch::Sender<CacheStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting stats task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let stats = cache.stats();
            info!(
                local_hits = stats.local_hits,
                remote_hits = stats.remote_hits,
                misses = stats.misses,
                hit_rate = stats.hit_rate(),
                local_entries = stats.local_entries,
                evictions = stats.evictions,
                remote_failures = stats.remote_failures,
                tracked_keys = stats.tracked_keys,
                "Cache stats"
            );

            // No receivers is fine; the log line above is the report
            let _ = latest.send(stats);
        }
    })
}
