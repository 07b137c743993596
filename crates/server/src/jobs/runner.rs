// crates/server/src/jobs/runner.rs
//! Central job runner that owns every retrieval job's lifecycle.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use clipfetch_core::media::{
    MetadataExtractor, ProgressSink, RetrievalEvent, RetrievalExecutor, RetrievalRequest,
};
use clipfetch_core::{compute_job_id, sanitize_filename, JobId, MediaError, Quality};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use super::hub::BroadcastHub;
use super::progress::ProgressTracker;
use super::types::{JobStatus, ProgressSnapshot};
use crate::metrics;

const ARTIFACT_MISSING: &str = "artifact missing after retrieval reported success";

/// Live execution handle for one job id.
struct Execution {
    generation: u64,
    cancel: CancellationToken,
}

/// Central job runner.
///
/// Thread-safe via `Arc` wrapping. `start_job` spawns the extraction and
/// retrieval work and returns immediately; progress is observable through
/// the hub.
pub struct JobRunner {
    hub: Arc<BroadcastHub>,
    extractor: Arc<dyn MetadataExtractor>,
    executor: Arc<dyn RetrievalExecutor>,
    output_dir: PathBuf,
    next_generation: AtomicU64,
    executions: Arc<DashMap<JobId, Execution>>,
}

impl JobRunner {
    pub fn new(
        hub: Arc<BroadcastHub>,
        extractor: Arc<dyn MetadataExtractor>,
        executor: Arc<dyn RetrievalExecutor>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            hub,
            extractor,
            executor,
            output_dir: output_dir.into(),
            next_generation: AtomicU64::new(1),
            executions: Arc::new(DashMap::new()),
        }
    }

    /// Start retrieving `url` at `quality`.
    ///
    /// Idempotent while a job for the same (url, quality) is downloading:
    /// the existing id is returned and nothing new is spawned.
    pub fn start_job(&self, url: &str, quality: Quality) -> JobId {
        let job_id = compute_job_id(url, quality.as_str());
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let begun = self.hub.begin(&job_id, || {
            self.executions.insert(
                job_id.clone(),
                Execution {
                    generation,
                    cancel: cancel.clone(),
                },
            );
            ProgressSnapshot::started()
        });
        if !begun {
            tracing::debug!(job_id = %job_id.short(), "Job already downloading, not restarting");
            return job_id;
        }

        metrics::record_job_started(quality.as_str());
        tracing::info!(job_id = %job_id.short(), %quality, url, "Job started");

        let ctx = JobContext {
            job_id: job_id.clone(),
            generation,
            cancel,
            hub: Arc::clone(&self.hub),
            executions: Arc::clone(&self.executions),
        };
        let work = execute(
            ctx.clone(),
            url.to_string(),
            quality,
            Arc::clone(&self.extractor),
            Arc::clone(&self.executor),
            self.output_dir.clone(),
        );

        // Supervisor: observes panics in the execution task.
        tokio::spawn(async move {
            let outcome = match tokio::spawn(work).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    tracing::error!(job_id = %ctx.job_id.short(), "Job execution panicked");
                    Err("job execution panicked".to_string())
                }
                Err(e) => Err(format!("job execution aborted: {e}")),
            };
            ctx.finish(outcome);
            ctx.release();
        });

        job_id
    }

    /// Cancel a non-terminal job. Returns false for unknown or finished jobs.
    ///
    /// The job is marked `cancelled` immediately; the executor is asked to
    /// stop via its cancellation token.
    pub fn cancel_job(&self, job_id: &JobId) -> bool {
        let cancelled = self.hub.transition(job_id, |current| {
            if let Some(execution) = self.executions.get(job_id) {
                execution.cancel.cancel();
            }
            Some(ProgressSnapshot::cancelled(current))
        });
        if cancelled {
            metrics::record_job_finished(JobStatus::Cancelled.as_str());
            tracing::info!(job_id = %job_id.short(), "Job cancelled");
        }
        cancelled
    }

    pub fn snapshot(&self, job_id: &JobId) -> Option<ProgressSnapshot> {
        self.hub.get(job_id)
    }

    /// Every known job, most recently updated first.
    pub fn jobs(&self) -> Vec<(JobId, ProgressSnapshot)> {
        self.hub.store().list()
    }

    /// Jobs that have not reached a terminal state.
    pub fn active_jobs(&self) -> Vec<(JobId, ProgressSnapshot)> {
        self.jobs()
            .into_iter()
            .filter(|(_, s)| !s.is_terminal())
            .collect()
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }
}

/// What one execution needs to publish on behalf of its job.
#[derive(Clone)]
struct JobContext {
    job_id: JobId,
    generation: u64,
    cancel: CancellationToken,
    hub: Arc<BroadcastHub>,
    executions: Arc<DashMap<JobId, Execution>>,
}

impl JobContext {
    /// Still the live execution for this id and not cancelled.
    fn is_current(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .executions
                .get(&self.job_id)
                .is_some_and(|e| e.generation == self.generation)
    }

    /// Publish `next(current)` unless this execution has been superseded.
    fn publish_with(&self, next: impl FnOnce(&ProgressSnapshot) -> ProgressSnapshot) -> bool {
        self.hub
            .transition(&self.job_id, |current| self.is_current().then(|| next(current)))
    }

    fn finish(&self, outcome: Result<(String, PathBuf), String>) {
        match outcome {
            Ok((filename, path)) => {
                let published = self.publish_with(|current| {
                    ProgressSnapshot::completed(current, filename.clone(), &path)
                });
                if published {
                    metrics::record_job_finished(JobStatus::Completed.as_str());
                    tracing::info!(
                        job_id = %self.job_id.short(),
                        filename = %filename,
                        "Job completed"
                    );
                }
            }
            Err(message) => {
                let published =
                    self.publish_with(|current| ProgressSnapshot::failed(current, message.clone()));
                if published {
                    metrics::record_job_finished(JobStatus::Failed.as_str());
                    tracing::warn!(job_id = %self.job_id.short(), error = %message, "Job failed");
                }
            }
        }
    }

    /// Drop this execution's handle unless a newer one replaced it.
    fn release(&self) {
        self.executions
            .remove_if(&self.job_id, |_, e| e.generation == self.generation);
    }
}

async fn execute(
    ctx: JobContext,
    url: String,
    quality: Quality,
    extractor: Arc<dyn MetadataExtractor>,
    executor: Arc<dyn RetrievalExecutor>,
    output_dir: PathBuf,
) -> Result<(String, PathBuf), String> {
    let info = extractor.extract(&url).await.map_err(|e| e.to_string())?;

    let mut safe_title = sanitize_filename(info.title_or_default());
    if safe_title.is_empty() {
        safe_title = ctx.job_id.to_string();
    }
    let filename = quality.output_filename(&safe_title);
    let output_path = output_dir.join(&filename);

    tracing::debug!(
        job_id = %ctx.job_id.short(),
        executor = executor.name(),
        path = %output_path.display(),
        "Retrieval starting"
    );

    let tracker = Arc::new(Mutex::new(ProgressTracker::new()));
    let sink: ProgressSink = {
        let tracker = Arc::clone(&tracker);
        let ctx = ctx.clone();
        Arc::new(move |event: RetrievalEvent| {
            let mut tracker = lock_tracker(&tracker);
            if let Some(snapshot) = tracker.apply(event) {
                ctx.publish_with(|_| snapshot);
            }
        })
    };

    let request = RetrievalRequest {
        url,
        quality,
        output_path: output_path.clone(),
    };
    let result = executor.retrieve(request, sink, ctx.cancel.clone()).await;

    let reported = lock_tracker(&tracker).error().map(str::to_string);
    match (result, reported) {
        (_, Some(message)) => Err(message),
        (Err(e), None) => Err(e.to_string()),
        (Ok(()), None) => match tokio::fs::try_exists(&output_path).await {
            Ok(true) => Ok((filename, output_path)),
            Ok(false) => Err(ARTIFACT_MISSING.to_string()),
            Err(e) => Err(MediaError::io(&output_path, e).to_string()),
        },
    }
}

fn lock_tracker(tracker: &Mutex<ProgressTracker>) -> std::sync::MutexGuard<'_, ProgressTracker> {
    match tracker.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("Progress tracker mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
