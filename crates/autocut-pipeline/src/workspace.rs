//! Per-run temporary files.
//!
//! Every run gets its own directory named after its [`RunId`], holding the
//! staged input and the render output, so concurrent runs never share paths.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tracing::{debug, warn};

use autocut_media::{remove_with_retry, MediaError, MediaResult};
use autocut_models::RunId;

const RENDER_FILE: &str = "render.mp4";

/// Temporary paths owned by one run.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: PathBuf,
    input: PathBuf,
    render: PathBuf,
    retry_delay: Duration,
}

impl RunWorkspace {
    /// Lay out the workspace for `run_id` under `work_dir`. Nothing is created yet.
    pub fn new(work_dir: &Path, run_id: &RunId, source: &Path, retry_delay: Duration) -> Self {
        let dir = work_dir.join(format!("run-{}", run_id));
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or("mp4");
        Self {
            input: dir.join(format!("input.{}", ext)),
            render: dir.join(RENDER_FILE),
            dir,
            retry_delay,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staged copy of the source video.
    pub fn input_path(&self) -> &Path {
        &self.input
    }

    /// Where the encoder writes before the output is moved into place.
    pub fn render_path(&self) -> &Path {
        &self.render
    }

    /// Create the directory and stage `source` as the run's input.
    ///
    /// A hard link is tried first; a copy is made when linking fails
    /// (for example across filesystems).
    pub async fn stage_input(&self, source: &Path) -> MediaResult<()> {
        if !fs::try_exists(source).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(source.to_path_buf()));
        }

        fs::create_dir_all(&self.dir).await?;

        if let Err(e) = fs::hard_link(source, &self.input).await {
            debug!(
                "Hard link of {} failed ({}), copying instead",
                source.display(),
                e
            );
            fs::copy(source, &self.input).await?;
        }
        Ok(())
    }

    /// Remove the run's files and directory.
    ///
    /// Safe to call repeatedly. Each file removal is retried once after the
    /// configured delay; failures are logged and reported as `false`.
    pub async fn cleanup(&self) -> bool {
        let mut clean = true;
        for path in [&self.input, &self.render] {
            clean &= remove_with_retry(path, self.retry_delay).await;
        }

        match fs::remove_dir(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Could not remove run directory {}: {}", self.dir.display(), e);
                clean = false;
            }
        }
        clean
    }
}
