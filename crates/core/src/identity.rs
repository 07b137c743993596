// crates/core/src/identity.rs
//! Deterministic job identifiers.
//!
//! A job is keyed by the pair (source URL, encoding selector). Repeat requests
//! for the same pair map to the same id, which is what lets the runner
//! deduplicate in-flight work.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept in the id (32 hex chars).
const ID_BYTES: usize = 16;

/// Stable identifier for one (url, selector) job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 chars, for log lines.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Compute the job id for a (url, selector) pair.
///
/// Total over all inputs: empty strings hash like any other value.
pub fn compute_job_id(url: &str, selector: &str) -> JobId {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"_");
    hasher.update(selector.as_bytes());
    let digest = hasher.finalize();
    JobId(hex::encode(&digest[..ID_BYTES]))
}
