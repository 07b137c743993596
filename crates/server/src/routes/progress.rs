// crates/server/src/routes/progress.rs
//! SSE stream of one job's progress.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use clipfetch_core::JobId;
use tokio_stream::{Stream, StreamExt};

use crate::jobs::progress_stream;
use crate::state::AppState;

/// GET /api/download-progress/{job_id}
///
/// | Event data                  | When                                       |
/// |-----------------------------|--------------------------------------------|
/// | snapshot JSON               | On connect (if known) and on every update  |
/// | `{"status":"keepalive"}`    | After the keepalive interval with no update |
///
/// The stream ends after a terminal snapshot. Unknown ids are not an
/// error: the connection waits for the job to appear.
async fn stream_progress(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let job_id = JobId::from(job_id);
    tracing::debug!(job_id = %job_id.short(), "Progress stream opened");

    let events = progress_stream(Arc::clone(state.runner.hub()), job_id, state.keepalive)
        .map(|event| Ok(Event::default().data(event.to_json())));

    Sse::new(events)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/download-progress/{job_id}", get(stream_progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::ProgressSnapshot;
    use crate::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_stream_ends_after_terminal_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let job = JobId::from("finished-job");
        state.runner.hub().publish(
            &job,
            ProgressSnapshot::failed(&ProgressSnapshot::started(), "HTTP Error 404"),
        );

        let app = Router::new().nest("/api", router()).with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/download-progress/finished-job")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let data: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("data: "))
            .collect();
        assert_eq!(data.len(), 1);
        assert!(data[0].contains("\"status\":\"failed\""));
        assert!(data[0].contains("HTTP Error 404"));
    }
}
