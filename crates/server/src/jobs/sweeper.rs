// crates/server/src/jobs/sweeper.rs
//! Evicts finished jobs from the store once they have aged out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::hub::BroadcastHub;

/// Remove terminal snapshots last updated more than `retention` ago.
///
/// Downloading jobs are never touched. Returns the number removed.
pub fn sweep_expired(hub: &BroadcastHub, retention: Duration) -> usize {
    let Ok(retention) = chrono::Duration::from_std(retention) else {
        return 0;
    };
    let cutoff = Utc::now() - retention;
    hub.store()
        .retain(|_, snapshot| !(snapshot.is_terminal() && snapshot.updated_at < cutoff))
}

/// Run `sweep_expired` every `interval` until `shutdown` fires.
///
/// Returns `None` when `retention` is zero (eviction disabled).
pub fn spawn_sweeper(
    hub: Arc<BroadcastHub>,
    retention: Duration,
    interval: Duration,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    if retention.is_zero() {
        tracing::info!("Job retention disabled, finished jobs are kept indefinitely");
        return None;
    }
    let interval = interval.max(Duration::from_secs(1));

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = sweep_expired(&hub, retention);
                    if removed > 0 {
                        tracing::info!(removed, remaining = hub.store().len(), "Evicted finished jobs");
                    }
                }
            }
        }
    }))
}
