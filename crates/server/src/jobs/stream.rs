// crates/server/src/jobs/stream.rs
//! Per-connection progress stream for one job.

use std::sync::Arc;
use std::time::Duration;

use clipfetch_core::JobId;
use tokio_stream::Stream;

use super::hub::BroadcastHub;
use super::registry::SubscriberId;
use super::types::{ProgressSnapshot, StreamEvent};

/// Unregisters the subscription however the stream ends.
struct Unsubscribe {
    hub: Arc<BroadcastHub>,
    job_id: JobId,
    id: SubscriberId,
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.hub.registry().unsubscribe(&self.job_id, self.id);
        tracing::debug!(job_id = %self.job_id.short(), "Progress stream closed");
    }
}

/// Stream snapshots for `job_id` until it reaches a terminal state.
///
/// The current snapshot (if any) is emitted first. A `Keepalive` is emitted
/// whenever `keepalive` elapses with nothing to send. The subscription is
/// registered before this returns, so nothing published afterwards is missed.
pub fn progress_stream(
    hub: Arc<BroadcastHub>,
    job_id: JobId,
    keepalive: Duration,
) -> impl Stream<Item = StreamEvent> {
    let (initial, subscription) = hub.join(&job_id);
    let mut rx = subscription.rx;
    let guard = Unsubscribe {
        hub,
        job_id,
        id: subscription.id,
    };

    async_stream::stream! {
        let guard = guard;
        let mut last: Option<ProgressSnapshot> = None;

        if let Some(snapshot) = initial {
            last = Some(snapshot.clone());
            yield StreamEvent::Snapshot(snapshot);
        }

        while !last.as_ref().is_some_and(ProgressSnapshot::is_terminal) {
            match tokio::time::timeout(keepalive, rx.recv()).await {
                Ok(Some(snapshot)) => {
                    last = Some(snapshot.clone());
                    yield StreamEvent::Snapshot(snapshot);
                }
                Ok(None) => {
                    // Slots are released after a terminal publish even when
                    // this subscriber's queue was too full to take it.
                    if let Some(snapshot) = guard.hub.get(&guard.job_id) {
                        if snapshot.is_terminal() && last.as_ref() != Some(&snapshot) {
                            yield StreamEvent::Snapshot(snapshot);
                        }
                    }
                    break;
                }
                Err(_) => yield StreamEvent::Keepalive,
            }
        }
    }
}
