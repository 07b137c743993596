// crates/server/src/routes/media.rs
//! Source metadata lookup.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use clipfetch_core::media::{describe, MediaMetadata};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VideoInfoRequest {
    pub url: String,
}

async fn lookup(state: &AppState, url: &str) -> ApiResult<Json<MediaMetadata>> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }
    let info = state.extractor.extract(url).await?;
    let metadata = describe(&info);
    tracing::debug!(
        extractor = state.extractor.name(),
        formats = metadata.formats.len(),
        "Metadata resolved"
    );
    Ok(Json(metadata))
}

/// POST /api/video-info
async fn video_info_post(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VideoInfoRequest>,
) -> ApiResult<Json<MediaMetadata>> {
    lookup(&state, &req.url).await
}

/// GET /api/video-info?url=
async fn video_info_get(
    State(state): State<Arc<AppState>>,
    Query(req): Query<VideoInfoRequest>,
) -> ApiResult<Json<MediaMetadata>> {
    lookup(&state, &req.url).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/video-info", get(video_info_get).post(video_info_post))
}
