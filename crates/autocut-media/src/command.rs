//! FFmpeg invocation: command line for one encode and a supervised runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::{EncodeProgress, ProgressReader};

/// Diagnostic stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One encode: a single input, an optional filter graph, mapped outputs
/// and codec settings.
#[derive(Debug, Clone)]
pub struct EncodeCommand {
    input: PathBuf,
    output: PathBuf,
    filter_graph: Option<String>,
    maps: Vec<String>,
    codec_args: Vec<String>,
}

impl EncodeCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            filter_graph: None,
            maps: Vec::new(),
            codec_args: Vec::new(),
        }
    }

    /// Use `graph` as the `-filter_complex` graph.
    pub fn filter_graph(mut self, graph: impl Into<String>) -> Self {
        self.filter_graph = Some(graph.into());
        self
    }

    /// Send a graph output label (or input stream) to the output file.
    pub fn map(mut self, label: impl Into<String>) -> Self {
        self.maps.push(label.into());
        self
    }

    pub fn video(mut self, codec: &str, preset: &str, crf: u8) -> Self {
        self.codec_args.extend([
            "-c:v".to_string(),
            codec.to_string(),
            "-preset".to_string(),
            preset.to_string(),
            "-crf".to_string(),
            crf.to_string(),
        ]);
        self
    }

    pub fn audio(mut self, codec: &str, bitrate: &str) -> Self {
        self.codec_args.extend([
            "-c:a".to_string(),
            codec.to_string(),
            "-b:a".to_string(),
            bitrate.to_string(),
        ]);
        self
    }

    pub fn no_audio(mut self) -> Self {
        self.codec_args.push("-an".to_string());
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Full argument list, progress reporting on stderr included.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-y",
            "-v",
            "error",
            "-nostats",
            "-progress",
            "pipe:2",
            "-i",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(self.input.to_string_lossy().into_owned());

        if let Some(graph) = &self.filter_graph {
            args.push("-filter_complex".to_string());
            args.push(graph.clone());
        }
        for label in &self.maps {
            args.push("-map".to_string());
            args.push(label.clone());
        }
        args.extend(self.codec_args.iter().cloned());
        args.push("-movflags".to_string());
        args.push("+faststart".to_string());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Runs FFmpeg under a timeout and a cancellation signal.
///
/// The child is spawned with `kill_on_drop`, and is reaped or killed
/// before [`FfmpegRunner::run`] returns.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run `cmd`, handing each progress snapshot to `on_progress`.
    pub async fn run<F>(&self, cmd: &EncodeCommand, on_progress: F) -> MediaResult<()>
    where
        F: FnMut(EncodeProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.to_args();
        debug!("Running ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("ffmpeg stderr was not piped"))?;
        let reader = tokio::spawn(read_stderr(stderr, on_progress));

        let waited = self.supervise(&mut child).await;
        let diagnostics = reader.await.unwrap_or_default();

        let status = waited?;
        if status.success() {
            return Ok(());
        }
        Err(MediaError::ffmpeg_failed(
            format!("ffmpeg exited with {}", status),
            (!diagnostics.is_empty()).then_some(diagnostics),
            status.code(),
        ))
    }

    async fn supervise(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let timeout = expire_after(self.timeout_secs);
        tokio::pin!(timeout);
        let mut cancel_rx = self.cancel_rx.clone();

        loop {
            if cancel_rx.as_ref().is_some_and(|rx| *rx.borrow()) {
                warn!("Render cancelled, killing ffmpeg");
                let _ = child.kill().await;
                return Err(MediaError::Cancelled);
            }

            tokio::select! {
                status = child.wait() => return Ok(status?),
                _ = &mut timeout => {
                    let secs = self.timeout_secs.unwrap_or_default();
                    warn!("ffmpeg still running after {}s, killing it", secs);
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(secs));
                }
                changed = cancel_signal(&mut cancel_rx) => {
                    if changed.is_err() {
                        // Sender dropped
                        cancel_rx = None;
                    }
                }
            }
        }
    }
}

/// Route progress lines to `on_progress`; return the diagnostic tail.
async fn read_stderr<F>(stderr: ChildStderr, mut on_progress: F) -> String
where
    F: FnMut(EncodeProgress),
{
    let mut lines = BufReader::new(stderr).lines();
    let mut progress = ProgressReader::new();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

    while let Ok(Some(line)) = lines.next_line().await {
        if ProgressReader::is_progress_line(&line) {
            if let Some(snapshot) = progress.feed(&line) {
                on_progress(snapshot);
            }
        } else if !line.trim().is_empty() {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }

    Vec::from(tail).join("\n")
}

async fn expire_after(secs: Option<u64>) {
    match secs {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => std::future::pending().await,
    }
}

async fn cancel_signal(
    cancel_rx: &mut Option<watch::Receiver<bool>>,
) -> Result<(), watch::error::RecvError> {
    match cancel_rx {
        Some(rx) => rx.changed().await,
        None => std::future::pending().await,
    }
}

/// Locate `ffmpeg` on PATH.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Locate `ffprobe` on PATH.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
