// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the media extractor and retrieval executor.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to spawn {tool}: {message}")]
    SpawnFailed { tool: String, message: String },

    #[error("{tool} exited with an error: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Failed to parse {what}: {message}")]
    ParseFailed { what: &'static str, message: String },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Retrieval cancelled")]
    Cancelled,

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MediaError {
    pub fn tool_failed(tool: impl Into<String>, stderr: &str) -> Self {
        // Last non-empty line is the one yt-dlp prefixes with "ERROR:".
        let message = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("unknown error")
            .to_string();
        Self::ToolFailed {
            tool: tool.into(),
            message,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_keeps_last_stderr_line() {
        let err = MediaError::tool_failed(
            "yt-dlp",
            "WARNING: something\nERROR: Video unavailable\n\n",
        );
        assert_eq!(
            err.to_string(),
            "yt-dlp exited with an error: ERROR: Video unavailable"
        );
    }

    #[test]
    fn test_tool_failed_empty_stderr() {
        let err = MediaError::tool_failed("yt-dlp", "");
        assert!(err.to_string().ends_with("unknown error"));
    }

    #[test]
    fn test_media_error_display() {
        assert_eq!(MediaError::Timeout(60).to_string(), "Timeout after 60 seconds");
        assert_eq!(MediaError::Cancelled.to_string(), "Retrieval cancelled");

        let err = MediaError::io(
            "/tmp/out.mp4",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(err.to_string().contains("/tmp/out.mp4"));
        assert!(err.to_string().contains("disk full"));
    }
}
