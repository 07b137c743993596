// crates/server/src/config.rs
//! Command-line / environment configuration for the server binary.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Origins allowed by default: the local frontend dev servers.
pub const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:4900",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored when attached to a terminal
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "clipfetch")]
#[command(about = "Video retrieval service with live progress streaming", long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "CLIPFETCH_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "CLIPFETCH_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory finished files are written to (default: ~/Downloads/youtube_videos)
    #[arg(long, env = "CLIPFETCH_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// CORS origin to allow; repeatable. `*` allows any origin.
    #[arg(
        long = "allowed-origin",
        env = "CLIPFETCH_ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    pub allowed_origins: Vec<String>,

    /// Seconds of silence before a progress stream sends a keepalive
    #[arg(long, env = "CLIPFETCH_KEEPALIVE_SECS", default_value_t = 30)]
    pub keepalive_secs: u64,

    /// Per-subscriber queue length; updates beyond it are dropped for that subscriber
    #[arg(long, env = "CLIPFETCH_SUBSCRIBER_CAPACITY", default_value_t = 256)]
    pub subscriber_capacity: usize,

    /// Seconds finished jobs are kept before eviction (0 keeps them forever)
    #[arg(long, env = "CLIPFETCH_RETENTION_SECS", default_value_t = 3600)]
    pub retention_secs: u64,

    /// Seconds between eviction sweeps
    #[arg(long, env = "CLIPFETCH_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// yt-dlp command (may include leading arguments, e.g. "python3 -m yt_dlp")
    #[arg(long, env = "CLIPFETCH_YTDLP_PATH", default_value = "yt-dlp")]
    pub ytdlp_path: String,

    /// Retry count passed to yt-dlp for transfers and fragments
    #[arg(long, env = "CLIPFETCH_RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// Timeout for metadata extraction, in seconds
    #[arg(long, env = "CLIPFETCH_EXTRACT_TIMEOUT_SECS", default_value_t = 60)]
    pub extract_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "CLIPFETCH_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Configured output directory, else `~/Downloads/youtube_videos`.
    ///
    /// Falls back to a relative `downloads` directory when no home directory exists.
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .map(|d| d.join("youtube_videos"))
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }

    /// Configured origins, or the local dev defaults when none were given.
    pub fn origins(&self) -> Vec<String> {
        if self.allowed_origins.is_empty() {
            DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect()
        } else {
            self.allowed_origins.clone()
        }
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.max(1))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
