// crates/server/src/jobs/types.rs
//! Types for the background job system.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a retrieval job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Downloading,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Completed, failed and cancelled jobs never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Downloading)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

/// Point-in-time description of a job. Replaced, never mutated, on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: JobStatus,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    pub downloaded_bytes: u64,
    /// 0 when unknown.
    pub total_bytes: u64,
    pub speed: String,
    pub eta: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressSnapshot {
    /// Fresh `downloading` snapshot seeded when a job starts.
    pub fn started() -> Self {
        Self {
            status: JobStatus::Downloading,
            progress: 0.0,
            downloaded_bytes: 0,
            total_bytes: 0,
            speed: "0 B/s".to_string(),
            eta: "Unknown".to_string(),
            updated_at: Utc::now(),
            filename: None,
            file_path: None,
            error: None,
        }
    }

    /// In-flight update. `progress` is clamped into `0..=100`.
    pub fn downloading(
        progress: f64,
        downloaded_bytes: u64,
        total_bytes: u64,
        speed: String,
        eta: String,
    ) -> Self {
        Self {
            status: JobStatus::Downloading,
            progress: clamp_percent(progress),
            downloaded_bytes,
            total_bytes,
            speed,
            eta,
            updated_at: Utc::now(),
            filename: None,
            file_path: None,
            error: None,
        }
    }

    /// Terminal success, carrying the artifact name and path.
    pub fn completed(previous: &ProgressSnapshot, filename: String, path: &Path) -> Self {
        Self {
            status: JobStatus::Completed,
            progress: 100.0,
            downloaded_bytes: previous.downloaded_bytes,
            total_bytes: previous.total_bytes,
            speed: "0 B/s".to_string(),
            eta: "Unknown".to_string(),
            updated_at: Utc::now(),
            filename: Some(filename),
            file_path: Some(path.to_string_lossy().into_owned()),
            error: None,
        }
    }

    /// Terminal failure. An empty message is replaced so `error` is never blank.
    pub fn failed(previous: &ProgressSnapshot, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        };
        Self {
            status: JobStatus::Failed,
            speed: "0 B/s".to_string(),
            eta: "Unknown".to_string(),
            updated_at: Utc::now(),
            filename: None,
            file_path: None,
            error: Some(message),
            ..previous.clone()
        }
    }

    /// Terminal cancellation; byte counters are kept for the client's benefit.
    pub fn cancelled(previous: &ProgressSnapshot) -> Self {
        Self {
            status: JobStatus::Cancelled,
            speed: "0 B/s".to_string(),
            eta: "Unknown".to_string(),
            updated_at: Utc::now(),
            filename: None,
            file_path: None,
            error: None,
            ..previous.clone()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

fn clamp_percent(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 100.0)
    }
}

/// One item on a progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Snapshot(ProgressSnapshot),
    /// Sent when nothing happened within the keepalive interval. Never stored.
    Keepalive,
}

impl StreamEvent {
    /// JSON payload for the SSE `data:` field.
    pub fn to_json(&self) -> String {
        match self {
            StreamEvent::Snapshot(s) => serde_json::to_string(s).unwrap_or_default(),
            StreamEvent::Keepalive => r#"{"status":"keepalive"}"#.to_string(),
        }
    }
}
