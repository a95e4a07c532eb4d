//! Expiry Sweep Task
//!
//! Background task that periodically removes expired local-tier entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TieredCache;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for `interval` between sweeps. Each sweep holds the
/// local-tier lock only for the scan itself.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(cache: Arc<TieredCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
