// crates/core/src/quality.rs
//! Quality tiers a client can request.
//!
//! Each tier has a fixed selector literal (part of the job identity), a
//! filename suffix, and the yt-dlp format expression handed to the executor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    /// Best available up to 1080p, walking down the ladder on failure.
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "480p")]
    Sd480,
    #[serde(rename = "360p")]
    Sd360,
}

impl Quality {
    pub const ALL: [Quality; 5] = [
        Quality::Simple,
        Quality::Hd1080,
        Quality::Hd720,
        Quality::Sd480,
        Quality::Sd360,
    ];

    /// Selector literal used in the job identity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Simple => "simple",
            Quality::Hd1080 => "1080p",
            Quality::Hd720 => "720p",
            Quality::Sd480 => "480p",
            Quality::Sd360 => "360p",
        }
    }

    /// Suffix appended to the output filename so tiers of one source don't collide.
    pub fn file_suffix(&self) -> Option<&'static str> {
        match self {
            Quality::Simple => None,
            other => Some(other.as_str()),
        }
    }

    /// yt-dlp `-f` expression for this tier.
    pub fn format_expr(&self) -> &'static str {
        match self {
            Quality::Simple => {
                "best[height<=1080]+bestaudio/best[height<=720]+bestaudio/best[height<=480]+bestaudio/best"
            }
            Quality::Hd1080 => "best[height<=1080]+bestaudio/best[height<=1080]/best",
            Quality::Hd720 => "best[height<=720]+bestaudio/best[height<=720]/best",
            Quality::Sd480 => "best[height<=480]+bestaudio/best[height<=480]/best",
            Quality::Sd360 => "best[height<=360]+bestaudio/best[height<=360]/best",
        }
    }

    /// Output filename for a sanitized title.
    pub fn output_filename(&self, safe_title: &str) -> String {
        match self.file_suffix() {
            Some(suffix) => format!("{safe_title}_{suffix}.mp4"),
            None => format!("{safe_title}.mp4"),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for selector strings that name no known tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown encoding selector: {0}")]
pub struct UnknownQuality(pub String);

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}
