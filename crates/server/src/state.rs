// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clipfetch_core::media::MetadataExtractor;

use crate::jobs::JobRunner;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Owns every retrieval job and its progress hub.
    pub runner: Arc<JobRunner>,
    /// Used directly by the metadata endpoints.
    pub extractor: Arc<dyn MetadataExtractor>,
    /// Idle interval after which progress streams send a keepalive.
    pub keepalive: Duration,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(
        runner: Arc<JobRunner>,
        extractor: Arc<dyn MetadataExtractor>,
        keepalive: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            runner,
            extractor,
            keepalive,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
