// crates/core/src/media/provider.rs
//! Traits for the external collaborators the job runner drives.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::types::{MediaInfo, RetrievalEvent, RetrievalRequest};
use crate::error::MediaError;

/// Callback an executor reports raw progress through.
pub type ProgressSink = Arc<dyn Fn(RetrievalEvent) + Send + Sync>;

/// Resolves metadata (title, duration, formats) for a source URL.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<MediaInfo, MediaError>;

    /// Provider name for logging (e.g. "yt-dlp").
    fn name(&self) -> &str;
}

/// Performs one retrieval, reporting progress through `progress`.
///
/// Contract: zero or more `Downloading` events, then exactly one of
/// `Finished` / `Error`. `cancel` is advisory: implementations should stop
/// early when it fires but are not required to.
#[async_trait]
pub trait RetrievalExecutor: Send + Sync {
    async fn retrieve(
        &self,
        request: RetrievalRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<(), MediaError>;

    fn name(&self) -> &str;
}
