// crates/server/src/routes/jobs.rs
//! API routes for starting, inspecting and cancelling retrieval jobs.
//!
//! - POST   /jobs                      Start a job for any encoding selector
//! - POST   /download-{simple,1080p,..} Start a job at a fixed tier
//! - GET    /downloads                 List every known job
//! - GET    /downloads/{job_id}        Current snapshot of one job
//! - DELETE /downloads/{job_id}        Cancel an in-flight job (no-op once finished)

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use clipfetch_core::{JobId, Quality};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::jobs::{JobStatus, ProgressSnapshot};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub url: String,
    pub encoding_selector: String,
}

#[derive(Debug, Deserialize)]
pub struct TierRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct JobStarted {
    pub job_id: JobId,
    pub message: String,
    pub status: JobStatus,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct JobEntry {
    pub job_id: JobId,
    pub snapshot: ProgressSnapshot,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct JobList {
    pub jobs: Vec<JobEntry>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct MessageResponse {
    pub message: String,
}

fn start(state: &AppState, url: &str, quality: Quality) -> ApiResult<Json<JobStarted>> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("url must not be empty".to_string()));
    }
    let job_id = state.runner.start_job(url, quality);
    Ok(Json(JobStarted {
        job_id,
        message: "Download started".to_string(),
        status: JobStatus::Downloading,
    }))
}

/// POST /api/jobs
async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<Json<JobStarted>> {
    let quality: Quality = req.encoding_selector.parse()?;
    start(&state, &req.url, quality)
}

/// GET /api/downloads
async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobList> {
    let jobs: Vec<JobEntry> = state
        .runner
        .jobs()
        .into_iter()
        .map(|(job_id, snapshot)| JobEntry { job_id, snapshot })
        .collect();
    let total = jobs.len();
    Json(JobList { jobs, total })
}

/// GET /api/downloads/{job_id}
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ProgressSnapshot>> {
    state
        .runner
        .snapshot(&JobId::from(job_id.as_str()))
        .map(Json)
        .ok_or(ApiError::JobNotFound(job_id))
}

/// DELETE /api/downloads/{job_id}
///
/// Finished jobs are left as they are and reported with their final status.
async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = JobId::from(job_id.as_str());
    if state.runner.cancel_job(&id) {
        return Ok(Json(MessageResponse {
            message: "Download cancelled".to_string(),
        }));
    }
    match state.runner.snapshot(&id) {
        Some(snapshot) => Ok(Json(MessageResponse {
            message: format!("Download already {}", snapshot.status.as_str()),
        })),
        None => Err(ApiError::JobNotFound(job_id)),
    }
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    let mut router = Router::new()
        .route("/jobs", post(create_job))
        .route("/downloads", get(list_jobs))
        .route("/downloads/{job_id}", get(get_job).delete(cancel_job));

    for quality in Quality::ALL {
        router = router.route(
            &format!("/download-{quality}"),
            post(
                move |State(state): State<Arc<AppState>>, Json(req): Json<TierRequest>| async move {
                    start(&state, &req.url, quality)
                },
            ),
        );
    }
    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clipfetch_core::compute_job_id;
    use tower::ServiceExt;

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new().nest("/api", router()).with_state(state)
    }

    #[tokio::test]
    async fn test_create_job_returns_deterministic_id() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let body = serde_json::json!({"url": "https://x/v", "encoding_selector": "720p"});

        let (status, first) = send(app(state.clone()), "POST", "/api/jobs", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["job_id"], compute_job_id("https://x/v", "720p").as_str());
        assert_eq!(first["status"], "downloading");

        let (_, second) = send(app(state.clone()), "POST", "/api/jobs", Some(body)).await;
        assert_eq!(first["job_id"], second["job_id"]);
        assert_eq!(state.runner.active_jobs().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_selector_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let body = serde_json::json!({"url": "https://x/v", "encoding_selector": "8k"});
        let (status, json) = send(app(test_state(dir.path())), "POST", "/api/jobs", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["details"].as_str().unwrap().contains("8k"));
    }

    #[tokio::test]
    async fn test_blank_url_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let body = serde_json::json!({"url": "   "});
        let (status, _) = send(app(test_state(dir.path())), "POST", "/api/download-simple", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tier_routes_use_tier_selector() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        for (path, selector) in [
            ("/api/download-simple", "simple"),
            ("/api/download-1080p", "1080p"),
            ("/api/download-720p", "720p"),
            ("/api/download-480p", "480p"),
            ("/api/download-360p", "360p"),
        ] {
            let body = serde_json::json!({"url": "https://x/v"});
            let (status, json) = send(app(state.clone()), "POST", path, Some(body)).await;
            assert_eq!(status, StatusCode::OK, "{path}");
            assert_eq!(json["job_id"], compute_job_id("https://x/v", selector).as_str());
        }
        assert_eq!(state.runner.jobs().len(), 5);
    }

    #[tokio::test]
    async fn test_get_and_list_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let id = state.runner.start_job("https://x/v", Quality::Sd480);

        let (status, snap) = send(app(state.clone()), "GET", &format!("/api/downloads/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snap["status"], "downloading");

        let (status, list) = send(app(state.clone()), "GET", "/api/downloads", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["total"], 1);
        assert_eq!(list["jobs"][0]["job_id"], id.as_str());

        let (status, _) = send(app(state), "GET", "/api/downloads/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_known_then_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let id = state.runner.start_job("https://x/v", Quality::Simple);

        let uri = format!("/api/downloads/{id}");
        let (status, json) = send(app(state.clone()), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Download cancelled");
        assert_eq!(state.runner.snapshot(&id).unwrap().status, JobStatus::Cancelled);

        // already terminal: reported, not reopened
        let (status, json) = send(app(state.clone()), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Download already cancelled");
        assert_eq!(state.runner.snapshot(&id).unwrap().status, JobStatus::Cancelled);

        let (status, snap) = send(app(state.clone()), "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snap["status"], "cancelled");

        let (status, json) = send(app(state), "DELETE", "/api/downloads/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Download not found");
    }
}
