// crates/server/src/jobs/registry.rs
//! Per-job lists of subscriber channels.

use std::sync::atomic::{AtomicU64, Ordering};

use clipfetch_core::JobId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use super::types::ProgressSnapshot;
use crate::metrics;

/// Identifies one subscription within a job's subscriber list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Sending half of a subscriber channel, as held by the registry.
pub struct SubscriberSlot {
    pub id: SubscriberId,
    pub tx: mpsc::Sender<ProgressSnapshot>,
}

/// Receiving half handed to a stream connection.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub job_id: JobId,
    pub rx: mpsc::Receiver<ProgressSnapshot>,
}

pub struct SubscriberRegistry {
    subscribers: DashMap<JobId, Vec<SubscriberSlot>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl SubscriberRegistry {
    /// `capacity` bounds each subscriber's queue.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Register a fresh channel under `job_id`.
    ///
    /// `read` runs under the same entry lock, so whatever it observes is
    /// ordered before anything delivered on the new channel.
    pub fn subscribe<R>(&self, job_id: &JobId, read: impl FnOnce() -> R) -> (R, Subscription) {
        self.with_subscribers(job_id, |subs| {
            let seen = read();
            (seen, self.attach(job_id, subs))
        })
    }

    /// Remove one subscription. Absent ids are ignored.
    pub fn unsubscribe(&self, job_id: &JobId, id: SubscriberId) {
        if let Entry::Occupied(mut entry) = self.subscribers.entry(job_id.clone()) {
            let before = entry.get().len();
            entry.get_mut().retain(|slot| slot.id != id);
            let removed = before - entry.get().len();
            if entry.get().is_empty() {
                entry.remove();
            }
            if removed > 0 {
                metrics::record_subscribers(-(removed as f64));
            }
        }
    }

    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        self.subscribers.get(job_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Run `f` against the job's subscriber list while holding its entry lock.
    ///
    /// Anything `f` does (including store access) is serialized with other
    /// calls for the same job. Empty lists are never left in the map.
    pub(crate) fn with_subscribers<R>(
        &self,
        job_id: &JobId,
        f: impl FnOnce(&mut Vec<SubscriberSlot>) -> R,
    ) -> R {
        let before;
        let after;
        let out = match self.subscribers.entry(job_id.clone()) {
            Entry::Occupied(mut entry) => {
                before = entry.get().len();
                let out = f(entry.get_mut());
                after = entry.get().len();
                if after == 0 {
                    entry.remove();
                }
                out
            }
            Entry::Vacant(entry) => {
                let mut subs = Vec::new();
                before = 0;
                let out = f(&mut subs);
                after = subs.len();
                if after > 0 {
                    entry.insert(subs);
                }
                out
            }
        };
        if after != before {
            metrics::record_subscribers(after as f64 - before as f64);
        }
        out
    }

    /// Push a new slot onto `subs` and return its receiving half.
    fn attach(&self, job_id: &JobId, subs: &mut Vec<SubscriberSlot>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        subs.push(SubscriberSlot { id, tx });
        Subscription {
            id,
            job_id: job_id.clone(),
            rx,
        }
    }
}
