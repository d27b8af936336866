//! Cache Maintenance Task
//!
//! Background task that periodically trims both caches back under budget
//! and logs their statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{CacheContext, ExpressionRuntime};

/// Spawns a background task that runs an unprotected eviction pass on both
/// caches at a fixed interval.
///
/// Puts never evict the entry they insert, so a single oversized entry or a
/// burst of concurrent puts can leave a cache over budget; this pass
/// corrects that.
///
/// # Arguments
/// * `caches` - Shared program and JSON caches
/// * `interval_secs` - Interval in seconds between passes
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_maintenance_task<R: ExpressionRuntime>(
    caches: Arc<CacheContext<R>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache maintenance task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let (programs, documents) = caches.trim();
            if programs + documents > 0 {
                info!(
                    "Cache maintenance: evicted {} programs and {} JSON documents",
                    programs, documents
                );
            }

            let stats = caches.stats();
            debug!(
                "Cache stats: program entries={} bytes={}/{} hit_rate={:.3}, json entries={} bytes={}/{} hit_rate={:.3}",
                stats.program_cache.entry_count,
                stats.program_cache.approx_bytes_used,
                stats.program_cache.capacity_bytes,
                stats.program_cache.hit_rate(),
                stats.json_cache.entry_count,
                stats.json_cache.approx_bytes_used,
                stats.json_cache.capacity_bytes,
                stats.json_cache.hit_rate(),
            );
        }
    })
}
