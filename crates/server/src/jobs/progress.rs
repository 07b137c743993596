// crates/server/src/jobs/progress.rs
//! Normalizes raw executor events into progress snapshots.

use clipfetch_core::format::{format_eta, format_speed};
use clipfetch_core::media::RetrievalEvent;

use super::types::ProgressSnapshot;

/// Per-job accumulator fed by the executor's progress callback.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last_progress: f64,
    finished: bool,
    error: Option<String>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in. Returns the snapshot to publish, if any.
    ///
    /// Only `Downloading` events produce snapshots; `Finished` and `Error`
    /// are recorded for the runner to act on after the executor returns.
    pub fn apply(&mut self, event: RetrievalEvent) -> Option<ProgressSnapshot> {
        match event {
            RetrievalEvent::Downloading {
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
                speed,
                eta,
            } => {
                let total = total_bytes
                    .filter(|t| *t > 0)
                    .or(total_bytes_estimate.filter(|t| *t > 0));
                if let Some(total) = total {
                    let pct = downloaded_bytes as f64 / total as f64 * 100.0;
                    self.last_progress = pct.clamp(0.0, 100.0);
                }
                Some(ProgressSnapshot::downloading(
                    self.last_progress,
                    downloaded_bytes,
                    total.unwrap_or(0),
                    format_speed(speed),
                    format_eta(eta),
                ))
            }
            RetrievalEvent::Finished => {
                self.finished = true;
                None
            }
            RetrievalEvent::Error { message } => {
                if self.error.is_none() {
                    self.error = Some(message);
                }
                None
            }
        }
    }

    /// True once the executor reported the transfer done.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// First error the executor reported, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
