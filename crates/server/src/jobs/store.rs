// crates/server/src/jobs/store.rs
//! Latest-snapshot store, keyed by job id.

use clipfetch_core::JobId;
use dashmap::DashMap;

use super::types::ProgressSnapshot;

/// Single source of truth for "what is the current state of job J".
///
/// Writes go through `BroadcastHub`; everything else only reads.
#[derive(Default)]
pub struct ProgressStore {
    snapshots: DashMap<JobId, ProgressSnapshot>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &JobId) -> Option<ProgressSnapshot> {
        self.snapshots.get(job_id).map(|s| s.value().clone())
    }

    /// Last writer wins; the previous snapshot is replaced wholesale.
    pub fn set(&self, job_id: &JobId, snapshot: ProgressSnapshot) {
        self.snapshots.insert(job_id.clone(), snapshot);
    }

    /// All known jobs, most recently updated first.
    pub fn list(&self) -> Vec<(JobId, ProgressSnapshot)> {
        let mut all: Vec<_> = self
            .snapshots
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        all.sort_by(|a, b| b.1.updated_at.cmp(&a.1.updated_at));
        all
    }

    /// Drop every entry for which `keep` returns false. Returns how many were removed.
    pub fn retain(&self, mut keep: impl FnMut(&JobId, &ProgressSnapshot) -> bool) -> usize {
        let before = self.snapshots.len();
        self.snapshots.retain(|id, snap| keep(id, snap));
        before.saturating_sub(self.snapshots.len())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
