//! Media errors.

use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg executable is not on PATH")]
    FfmpegNotFound,

    #[error("ffprobe executable is not on PATH")]
    FfprobeNotFound,

    #[error("source file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("cannot read media: {0}")]
    InvalidVideo(String),

    /// Probe ran but exited unsuccessfully.
    #[error("probe of {} failed: {}", .path.display(), .stderr)]
    ProbeFailed { path: PathBuf, stderr: String },

    #[error("malformed ffprobe output: {0}")]
    ProbeOutput(#[from] serde_json::Error),

    /// The assembler was handed zero segments.
    #[error("timeline has no segments")]
    EmptyTimeline,

    /// Encoder exited unsuccessfully; `stderr` holds its last diagnostic lines.
    #[error("{message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("render cancelled")]
    Cancelled,

    #[error("render exceeded {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl MediaError {
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn invalid_video(message: impl Into<String>) -> Self {
        Self::InvalidVideo(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
