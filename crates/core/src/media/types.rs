// crates/core/src/media/types.rs
//! Request/response/event types for media extraction and retrieval.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::quality::Quality;

/// One format as reported by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl RawFormat {
    /// True when the format carries a video stream.
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    pub fn is_web_container(&self) -> bool {
        matches!(self.ext.as_deref(), Some("mp4") | Some("webm"))
    }

    /// `"720p"`, the format note, or `"Unknown"`.
    pub fn resolution_label(&self) -> String {
        match self.height {
            Some(h) if h > 0 => format!("{h}p"),
            _ => self
                .format_note
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Raw metadata for a source URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

impl MediaInfo {
    pub fn title_or_default(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Unknown Title")
    }
}

/// Client-facing encoding option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingOption {
    pub format_id: String,
    pub ext: String,
    pub resolution: String,
    pub filesize: Option<u64>,
    pub vcodec: String,
    pub acodec: String,
}

/// Client-facing metadata response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub duration: String,
    pub thumbnail: String,
    pub formats: Vec<EncodingOption>,
}

/// Everything an executor needs to perform one retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub url: String,
    pub quality: Quality,
    pub output_path: PathBuf,
}

/// Raw progress event emitted by an executor.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalEvent {
    Downloading {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<u64>,
        /// Bytes per second.
        speed: Option<f64>,
        /// Seconds remaining.
        eta: Option<f64>,
    },
    /// Transfer done; container merge may still be running.
    Finished,
    Error { message: String },
}
