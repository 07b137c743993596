// crates/server/src/test_support.rs
//! Fakes shared by router unit tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clipfetch_core::media::{
    MediaInfo, MetadataExtractor, ProgressSink, RawFormat, RetrievalEvent, RetrievalExecutor,
    RetrievalRequest,
};
use clipfetch_core::MediaError;
use tokio_util::sync::CancellationToken;

use crate::jobs::{BroadcastHub, JobRunner};
use crate::state::AppState;

/// Returns a fixed title and two formats; fails for URLs containing "bad".
pub struct StubExtractor;

#[async_trait]
impl MetadataExtractor for StubExtractor {
    async fn extract(&self, url: &str) -> Result<MediaInfo, MediaError> {
        if url.contains("bad") {
            return Err(MediaError::tool_failed("stub", "ERROR: Unsupported URL"));
        }
        Ok(MediaInfo {
            title: Some("Stub Clip".into()),
            duration: Some(75.0),
            thumbnail: Some("https://img/t.jpg".into()),
            formats: vec![
                RawFormat {
                    format_id: "22".into(),
                    ext: Some("mp4".into()),
                    height: Some(720),
                    vcodec: Some("avc1".into()),
                    filesize: Some(1000),
                    ..Default::default()
                },
                RawFormat {
                    format_id: "18".into(),
                    ext: Some("mp4".into()),
                    height: Some(360),
                    vcodec: Some("avc1".into()),
                    filesize: Some(300),
                    ..Default::default()
                },
            ],
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Blocks until cancelled, so jobs stay `downloading` for the duration of a test.
pub struct PendingExecutor;

#[async_trait]
impl RetrievalExecutor for PendingExecutor {
    async fn retrieve(
        &self,
        _request: RetrievalRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<(), MediaError> {
        progress(RetrievalEvent::Downloading {
            downloaded_bytes: 10,
            total_bytes: Some(100),
            total_bytes_estimate: None,
            speed: None,
            eta: None,
        });
        cancel.cancelled().await;
        Err(MediaError::Cancelled)
    }

    fn name(&self) -> &str {
        "pending"
    }
}

pub fn test_state(output_dir: &Path) -> Arc<AppState> {
    let extractor: Arc<dyn MetadataExtractor> = Arc::new(StubExtractor);
    let runner = JobRunner::new(
        Arc::new(BroadcastHub::new(16)),
        Arc::clone(&extractor),
        Arc::new(PendingExecutor),
        output_dir,
    );
    AppState::new(Arc::new(runner), extractor, Duration::from_secs(30))
}
