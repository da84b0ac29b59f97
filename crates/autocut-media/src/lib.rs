//! FFmpeg CLI wrapper for highlight assembly.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeout support via tokio
//! - Segment extraction + concatenation into one output (`ClipAssembler`)
//! - Render progress normalization (`RenderProgressTracker`)

pub mod assemble;
pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod tracker;

pub use assemble::{AssembledOutput, ClipAssembler, MediaRenderer};
pub use command::{check_ffmpeg, check_ffprobe, EncodeCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{move_file, remove_with_retry};
pub use probe::{get_duration, probe_video, VideoInfo};
pub use progress::{EncodeProgress, ProgressReader};
pub use tracker::{EncoderProgressSink, RenderProgressTracker, FRAME_BAR, TIMELINE_BAR};
