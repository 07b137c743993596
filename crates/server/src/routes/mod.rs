//! API route handlers for the clipfetch server.

pub mod health;
pub mod jobs;
pub mod media;
pub mod metrics;
pub mod progress;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router: API routes under `/api`, plus `/metrics`.
///
/// Routes:
/// - GET    /api/health - Health check with active job count
/// - POST   /api/jobs - Start a job for `{url, encoding_selector}`
/// - POST   /api/download-simple - Start a best-available job
/// - POST   /api/download-{1080p,720p,480p,360p} - Start a fixed-tier job
/// - GET    /api/download-progress/{job_id} - SSE progress stream
/// - GET    /api/downloads - List every known job
/// - GET    /api/downloads/{job_id} - Current snapshot
/// - DELETE /api/downloads/{job_id} - Cancel an in-flight job
/// - GET    /api/video-info?url= - Source metadata and encoding options
/// - POST   /api/video-info - Same, with a JSON body
/// - GET    /metrics - Prometheus metrics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", jobs::router())
        .nest("/api", media::router())
        .nest("/api", progress::router())
        .merge(metrics::router())
        .with_state(state)
}
