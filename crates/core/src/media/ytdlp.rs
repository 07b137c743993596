// crates/core/src/media/ytdlp.rs
//! yt-dlp provider: spawns the `yt-dlp` CLI for metadata and retrieval.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio_util::sync::CancellationToken;

use super::provider::{MetadataExtractor, ProgressSink, RetrievalExecutor};
use super::types::{MediaInfo, RetrievalEvent, RetrievalRequest};
use crate::error::MediaError;

const TOOL: &str = "yt-dlp";

/// Marker prefixed to every progress line we ask yt-dlp to print.
const PROGRESS_MARKER: &str = "clipfetch-progress";

/// Extractor + executor backed by the yt-dlp command line tool.
///
/// `command` may carry leading arguments, e.g. `"python3 -m yt_dlp"`.
#[derive(Debug, Clone)]
pub struct YtDlpCli {
    program: String,
    leading_args: Vec<String>,
    retries: u32,
    extract_timeout_secs: u64,
}

impl YtDlpCli {
    pub fn new(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| TOOL.to_string());
        Self {
            program,
            leading_args: parts.collect(),
            retries: 3,
            extract_timeout_secs: 60,
        }
    }

    /// Retry count forwarded to yt-dlp for requests and fragments.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_extract_timeout(mut self, secs: u64) -> Self {
        self.extract_timeout_secs = secs;
        self
    }

    fn command(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.leading_args)
            // Null stdin so the child never blocks waiting for input
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn extract_args(url: &str) -> Vec<String> {
        ["--dump-single-json", "--no-warnings", "--no-playlist", "--skip-download", "--", url]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn retrieve_args(&self, request: &RetrievalRequest) -> Vec<String> {
        let retries = self.retries.to_string();
        let template = format!(
            "download:{PROGRESS_MARKER} %(progress.status)s %(progress.downloaded_bytes)s \
             %(progress.total_bytes)s %(progress.total_bytes_estimate)s \
             %(progress.speed)s %(progress.eta)s"
        );
        vec![
            "--newline".into(),
            "--no-warnings".into(),
            "--no-playlist".into(),
            "--format".into(),
            request.quality.format_expr().into(),
            "--output".into(),
            // The output flag is itself a template; escape literal percent signs.
            request.output_path.to_string_lossy().replace('%', "%%"),
            "--merge-output-format".into(),
            "mp4".into(),
            "--remux-video".into(),
            "mp4".into(),
            "--retries".into(),
            retries.clone(),
            "--fragment-retries".into(),
            retries,
            "--progress-template".into(),
            template,
            "--".into(),
            request.url.clone(),
        ]
    }
}

/// Parse one stdout line produced by our `--progress-template`.
///
/// Only `downloading` lines become events; yt-dlp prints `finished` once per
/// stream (video, then audio), so completion is reported after the process exits.
pub fn parse_progress_line(line: &str) -> Option<RetrievalEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.split_whitespace();
    let status = fields.next()?;
    if status != "downloading" {
        return None;
    }

    fn num(field: Option<&str>) -> Option<f64> {
        field
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
    }

    let downloaded = num(fields.next());
    let total = num(fields.next());
    let estimate = num(fields.next());
    let speed = num(fields.next());
    let eta = num(fields.next());

    Some(RetrievalEvent::Downloading {
        downloaded_bytes: downloaded.unwrap_or(0.0) as u64,
        total_bytes: total.map(|v| v as u64),
        total_bytes_estimate: estimate.map(|v| v as u64),
        speed,
        eta,
    })
}

#[async_trait]
impl MetadataExtractor for YtDlpCli {
    async fn extract(&self, url: &str) -> Result<MediaInfo, MediaError> {
        let t0 = std::time::Instant::now();
        tracing::debug!(program = %self.program, url, "yt-dlp: extracting metadata");

        let mut cmd = self.command();
        cmd.args(Self::extract_args(url));

        let output = tokio::time::timeout(
            Duration::from_secs(self.extract_timeout_secs),
            cmd.output(),
        )
        .await
        .map_err(|_| {
            tracing::error!(elapsed_ms = t0.elapsed().as_millis() as u64, "yt-dlp: metadata timed out");
            MediaError::Timeout(self.extract_timeout_secs)
        })?
        .map_err(|e| MediaError::SpawnFailed {
            tool: TOOL.to_string(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(exit_code = ?output.status.code(), "yt-dlp: metadata extraction failed");
            return Err(MediaError::tool_failed(TOOL, &stderr));
        }

        let info: MediaInfo =
            serde_json::from_slice(&output.stdout).map_err(|e| MediaError::ParseFailed {
                what: "yt-dlp metadata",
                message: e.to_string(),
            })?;

        tracing::info!(
            title = info.title_or_default(),
            formats = info.formats.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "yt-dlp: metadata extracted"
        );
        Ok(info)
    }

    fn name(&self) -> &str {
        TOOL
    }
}

#[async_trait]
impl RetrievalExecutor for YtDlpCli {
    async fn retrieve(
        &self,
        request: RetrievalRequest,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<(), MediaError> {
        let mut cmd = self.command();
        cmd.args(self.retrieve_args(&request));

        tracing::info!(
            url = %request.url,
            quality = %request.quality,
            output = %request.output_path.display(),
            "yt-dlp: starting retrieval"
        );

        let mut child = cmd.spawn().map_err(|e| MediaError::SpawnFailed {
            tool: TOOL.to_string(),
            message: e.to_string(),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| MediaError::SpawnFailed {
            tool: TOOL.to_string(),
            message: "failed to capture stdout".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| MediaError::SpawnFailed {
            tool: TOOL.to_string(),
            message: "failed to capture stderr".to_string(),
        })?;

        // Drain stderr concurrently so a chatty child never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(url = %request.url, "yt-dlp: cancelled, killing child");
                    let _ = child.kill().await;
                    progress(RetrievalEvent::Error { message: MediaError::Cancelled.to_string() });
                    return Err(MediaError::Cancelled);
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_progress_line(&line) {
                            progress(event);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "yt-dlp: failed reading stdout");
                        break;
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|e| MediaError::SpawnFailed {
            tool: TOOL.to_string(),
            message: format!("failed to wait for {TOOL}: {e}"),
        })?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let err = MediaError::tool_failed(TOOL, &stderr);
            tracing::warn!(exit_code = ?status.code(), error = %err, "yt-dlp: retrieval failed");
            progress(RetrievalEvent::Error {
                message: err.to_string(),
            });
            return Err(err);
        }

        progress(RetrievalEvent::Finished);
        Ok(())
    }

    fn name(&self) -> &str {
        TOOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Quality;
    use std::sync::Mutex;

    #[test]
    fn test_parse_downloading_line() {
        let ev = parse_progress_line("clipfetch-progress downloading 512 1024 NA 256.5 2").unwrap();
        assert_eq!(
            ev,
            RetrievalEvent::Downloading {
                downloaded_bytes: 512,
                total_bytes: Some(1024),
                total_bytes_estimate: None,
                speed: Some(256.5),
                eta: Some(2.0),
            }
        );
    }

    #[test]
    fn test_parse_all_unknown_fields() {
        let ev = parse_progress_line("clipfetch-progress downloading NA NA NA NA NA").unwrap();
        assert_eq!(
            ev,
            RetrievalEvent::Downloading {
                downloaded_bytes: 0,
                total_bytes: None,
                total_bytes_estimate: None,
                speed: None,
                eta: None,
            }
        );
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        assert!(parse_progress_line("[download] Destination: x.mp4").is_none());
        assert!(parse_progress_line("clipfetch-progress finished 10 10 NA NA NA").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn test_command_with_leading_args() {
        let cli = YtDlpCli::new("python3 -m yt_dlp");
        assert_eq!(cli.program, "python3");
        assert_eq!(cli.leading_args, vec!["-m", "yt_dlp"]);

        let cli = YtDlpCli::new("");
        assert_eq!(cli.program, "yt-dlp");
    }

    #[test]
    fn test_retrieve_args() {
        let cli = YtDlpCli::new("yt-dlp").with_retries(5);
        let args = cli.retrieve_args(&RetrievalRequest {
            url: "https://example.com/v".into(),
            quality: Quality::Hd720,
            output_path: "/tmp/out/Title_720p.mp4".into(),
        });
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("--format") + 1], Quality::Hd720.format_expr());
        assert_eq!(args[pos("--output") + 1], "/tmp/out/Title_720p.mp4");
        assert_eq!(args[pos("--retries") + 1], "5");
        assert_eq!(args.last().unwrap(), "https://example.com/v");
        assert_eq!(args[args.len() - 2], "--");
    }

    #[cfg(unix)]
    fn fake_tool(dir: &std::path::Path, body: &str) -> YtDlpCli {
        let script = dir.join("fake-ytdlp.sh");
        std::fs::write(&script, body).unwrap();
        YtDlpCli::new(&format!("sh {}", script.display())).with_extract_timeout(5)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_parses_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_tool(
            dir.path(),
            r#"echo '{"title":"Fake","duration":61,"formats":[{"format_id":"18","ext":"mp4","height":360}]}'"#,
        );
        let info = cli.extract("https://example.com/v").await.unwrap();
        assert_eq!(info.title.as_deref(), Some("Fake"));
        assert_eq!(info.formats[0].height, Some(360));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_reports_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_tool(dir.path(), "echo 'ERROR: Unsupported URL' >&2; exit 1");
        let err = cli.extract("nope").await.unwrap_err();
        assert!(matches!(err, MediaError::ToolFailed { .. }));
        assert!(err.to_string().contains("Unsupported URL"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_retrieve_streams_progress_then_finished() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_tool(
            dir.path(),
            "echo 'clipfetch-progress downloading 10 100 NA 5 18'\n\
             echo 'noise'\n\
             echo 'clipfetch-progress downloading 100 100 NA 5 0'\n\
             echo 'clipfetch-progress finished 100 100 NA NA NA'\n",
        );

        let events = std::sync::Arc::new(Mutex::new(Vec::<RetrievalEvent>::new()));
        let sink_events = events.clone();
        let sink: ProgressSink = std::sync::Arc::new(move |ev: RetrievalEvent| {
            sink_events.lock().unwrap().push(ev)
        });

        cli.retrieve(
            RetrievalRequest {
                url: "u".into(),
                quality: Quality::Simple,
                output_path: dir.path().join("x.mp4"),
            },
            sink,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RetrievalEvent::Downloading { downloaded_bytes: 10, .. }));
        assert_eq!(events[2], RetrievalEvent::Finished);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_retrieve_cancel_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_tool(dir.path(), "sleep 30");
        let cancel = CancellationToken::new();
        let sink: ProgressSink = std::sync::Arc::new(|_: RetrievalEvent| {});

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = cli
            .retrieve(
                RetrievalRequest {
                    url: "u".into(),
                    quality: Quality::Simple,
                    output_path: dir.path().join("x.mp4"),
                },
                sink,
                cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
