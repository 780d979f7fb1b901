//! Fixed-interval prefetch of newly computed snapshots.
//!
//! Runs independently of request serving: each tick it asks the backing
//! store, for every conversation the cache tracks, whether a snapshot newer
//! than the cached version exists, and replaces entries wholesale when one
//! does. Conversations memoized as absent are probed too — the poller is how
//! their first snapshot eventually lands in the cache.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::store::Store;

use super::entry::CacheEntry;
use super::ResultCache;

/// Default fixed interval between prefetch passes.
pub const DEFAULT_PREFETCH_INTERVAL: Duration = Duration::from_secs(5);

/// One prefetch pass over every tracked conversation.
///
/// Store or decode failures for one conversation are logged and do not stop
/// the pass. Returns how many entries were refreshed.
pub async fn prefetch_pass<S: Store>(cache: &ResultCache, store: &S) -> usize {
    let mut refreshed = 0;
    for conversation in cache.tracked() {
        let known = cache.version_of(conversation);
        match store.latest_snapshot(conversation, known).await {
            Ok(Some(snapshot)) => match CacheEntry::build(snapshot) {
                Ok(entry) => {
                    if cache.insert(entry) {
                        refreshed += 1;
                    }
                }
                Err(e) => {
                    warn!(conversation = %conversation, error = %e, "failed to build cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(conversation = %conversation, error = %e, "prefetch lookup failed");
            }
        }
    }
    if refreshed > 0 {
        debug!(refreshed, "prefetch pass refreshed entries");
    }
    refreshed
}

/// Runs the prefetch loop until `shutdown` is cancelled.
pub async fn run_prefetch_loop<S: Store>(
    cache: Arc<ResultCache>,
    store: Arc<S>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    info!(interval_secs = interval.as_secs(), "result prefetch poller started");

    loop {
        prefetch_pass(&cache, &*store).await;

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("result prefetch poller stopping");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
