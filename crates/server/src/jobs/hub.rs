// crates/server/src/jobs/hub.rs
//! Fan-out of progress snapshots to every subscriber of a job.
//!
//! The hub owns both the store and the registry. Every write to the store
//! happens while holding the registry's entry lock for that job, so the
//! lock order is always registry entry, then store shard.

use clipfetch_core::JobId;
use tokio::sync::mpsc::error::TrySendError;

use super::registry::{SubscriberRegistry, Subscription};
use super::store::ProgressStore;
use super::types::{JobStatus, ProgressSnapshot};
use crate::metrics;

pub struct BroadcastHub {
    store: ProgressStore,
    registry: SubscriberRegistry,
}

impl BroadcastHub {
    pub fn new(subscriber_capacity: usize) -> Self {
        Self {
            store: ProgressStore::new(),
            registry: SubscriberRegistry::new(subscriber_capacity),
        }
    }

    /// Store `snapshot`, then deliver it to every subscriber of `job_id`.
    ///
    /// Full channels miss this update; closed channels are pruned. A
    /// terminal snapshot releases every slot for the job once delivered.
    pub fn publish(&self, job_id: &JobId, snapshot: ProgressSnapshot) {
        self.registry
            .with_subscribers(job_id, |subs| self.deliver(job_id, subs, snapshot));
    }

    /// Register a subscriber and read the current snapshot in one step.
    pub fn join(&self, job_id: &JobId) -> (Option<ProgressSnapshot>, Subscription) {
        self.registry.subscribe(job_id, || self.store.get(job_id))
    }

    /// Seed `job_id` unless it is already downloading. Returns whether it seeded.
    ///
    /// `seed` runs under the job's lock and only when seeding happens.
    pub fn begin(&self, job_id: &JobId, seed: impl FnOnce() -> ProgressSnapshot) -> bool {
        self.registry.with_subscribers(job_id, |subs| {
            let running = self
                .store
                .get(job_id)
                .is_some_and(|s| s.status == JobStatus::Downloading);
            if running {
                return false;
            }
            self.deliver(job_id, subs, seed());
            true
        })
    }

    /// Publish `next(current)` if the job is non-terminal and `next` yields a snapshot.
    ///
    /// `next` runs under the job's lock. Returns whether anything was published;
    /// unknown and finished jobs are never touched.
    pub fn transition(
        &self,
        job_id: &JobId,
        next: impl FnOnce(&ProgressSnapshot) -> Option<ProgressSnapshot>,
    ) -> bool {
        self.registry.with_subscribers(job_id, |subs| {
            let Some(current) = self.store.get(job_id).filter(|s| !s.is_terminal()) else {
                return false;
            };
            match next(&current) {
                Some(snapshot) => {
                    self.deliver(job_id, subs, snapshot);
                    true
                }
                None => false,
            }
        })
    }

    pub fn get(&self, job_id: &JobId) -> Option<ProgressSnapshot> {
        self.store.get(job_id)
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Caller must hold the job's registry entry lock (i.e. be inside `with_subscribers`).
    fn deliver(
        &self,
        job_id: &JobId,
        subs: &mut Vec<super::registry::SubscriberSlot>,
        snapshot: ProgressSnapshot,
    ) {
        let terminal = snapshot.is_terminal();
        self.store.set(job_id, snapshot.clone());

        subs.retain(|slot| match slot.tx.try_send(snapshot.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                metrics::record_update_dropped();
                tracing::debug!(
                    job_id = %job_id.short(),
                    subscriber = ?slot.id,
                    "Subscriber queue full, dropping update"
                );
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });

        if terminal {
            subs.clear();
        }
    }
}
