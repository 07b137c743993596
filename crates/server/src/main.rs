// crates/server/src/main.rs
//! clipfetch server binary.
//!
//! Parses configuration, wires the yt-dlp adapter into the job runner,
//! starts the retention sweeper and serves HTTP until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clipfetch_core::media::{MetadataExtractor, RetrievalExecutor, YtDlpCli};
use tokio_util::sync::CancellationToken;

use clipfetch_server::jobs::{spawn_sweeper, BroadcastHub, JobRunner};
use clipfetch_server::logging::init_tracing;
use clipfetch_server::metrics::init_metrics;
use clipfetch_server::{create_app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    init_tracing(config.log_format);
    init_metrics();

    let output_dir = config.resolved_output_dir();
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let ytdlp = Arc::new(
        YtDlpCli::new(&config.ytdlp_path)
            .with_retries(config.retries)
            .with_extract_timeout(config.extract_timeout_secs),
    );
    let extractor: Arc<dyn MetadataExtractor> = ytdlp.clone();
    let executor: Arc<dyn RetrievalExecutor> = ytdlp;

    let hub = Arc::new(BroadcastHub::new(config.subscriber_capacity));
    let runner = Arc::new(JobRunner::new(
        Arc::clone(&hub),
        Arc::clone(&extractor),
        executor,
        output_dir.clone(),
    ));
    let state = AppState::new(runner, extractor, config.keepalive());

    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(
        hub,
        config.retention(),
        config.sweep_interval(),
        shutdown.clone(),
    );

    let origins = config.origins();
    let app = create_app(state, &origins);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        %addr,
        output_dir = %output_dir.display(),
        origins = ?origins,
        "clipfetch listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server error")?;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }
    tracing::info!("clipfetch stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                shutdown.cancelled().await;
            }
        }
        _ = shutdown.cancelled() => {}
    }
    tracing::info!("Shutdown requested");
}
