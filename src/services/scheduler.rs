//! Background task scheduler.
//!
//! Runs periodic maintenance: duplicate-key eviction and the cached-path
//! retention sweep.

use std::sync::Arc;
use tokio::time::{interval, Duration};

use crate::config::Config;
use crate::services::dedup::DuplicateSuppressor;
use crate::services::path_store::PathStore;

/// Spawn all background tasks. Fire-and-forget; tasks run for the
/// process lifetime.
pub fn spawn_all(
    store: Arc<dyn PathStore>,
    suppressor: Arc<DuplicateSuppressor>,
    config: &Config,
) {
    // Duplicate-key eviction (every 60 seconds)
    {
        let suppressor = suppressor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            let mut ticker = interval(Duration::from_secs(60));

            loop {
                ticker.tick().await;
                let evicted = suppressor.sweep();
                if evicted > 0 {
                    tracing::debug!(evicted, retained = suppressor.len(), "Swept duplicate keys");
                }
            }
        });
    }

    // Retention sweep (daily)
    {
        let store = store.clone();
        let retention_days = config.retention_days;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let mut ticker = interval(Duration::from_secs(24 * 3600));

            loop {
                ticker.tick().await;
                match store
                    .delete_older_than(chrono::Duration::days(retention_days))
                    .await
                {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, retention_days, "Retention sweep removed records");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Retention sweep failed");
                    }
                }
            }
        });
    }
}
