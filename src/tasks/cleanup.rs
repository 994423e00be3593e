//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that runs [`cleanup`](crate::cache::MemoryCache::cleanup)
/// every `cleanup_interval_secs` seconds.
///
/// Expired entries are also dropped lazily on read; the sweep only bounds
/// memory held by keys nobody asks for again.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = shared_cache(MemoryCache::new());
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 300);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCache, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut cache_guard = cache.write().await;
                let removed = cache_guard.cleanup();
                (removed, cache_guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "TTL cleanup: removed expired entries");
            } else {
                debug!(remaining, "TTL cleanup: no expired entries found");
            }
        }
    })
}
