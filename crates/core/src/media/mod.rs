// crates/core/src/media/mod.rs
//! Media extraction and retrieval.
//!
//! Provides the `MetadataExtractor` and `RetrievalExecutor` traits the job
//! runner drives, the catalog that turns raw formats into client-facing
//! encoding options, and a yt-dlp-backed implementation of both traits.

pub mod catalog;
pub mod provider;
pub mod types;
pub mod ytdlp;

pub use catalog::describe;
pub use provider::{MetadataExtractor, ProgressSink, RetrievalExecutor};
pub use types::{EncodingOption, MediaInfo, MediaMetadata, RawFormat, RetrievalEvent, RetrievalRequest};
pub use ytdlp::YtDlpCli;
