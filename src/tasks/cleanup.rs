//! Expiry Sweep Task
//!
//! Background task that periodically removes expired content so memory is
//! reclaimed even for hashes nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ContentCache;

/// Spawns a task that sweeps expired entries every `interval_secs` seconds.
///
/// An interval of zero is treated as one second. Abort the returned handle
/// during shutdown.
pub fn spawn_sweep_task(cache: ContentCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired().await;
            if removed > 0 {
                info!(
                    "Expiry sweep: removed {} entries, {} live",
                    removed,
                    cache.size().await
                );
            } else {
                debug!("Expiry sweep: nothing expired");
            }
        }
    })
}
