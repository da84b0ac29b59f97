//! Highlight assembly.
//!
//! # Approach
//!
//! The source is opened once as the only FFmpeg input. Each segment becomes a
//! `trim`/`atrim` branch of one filter graph, is normalized to a common frame
//! format, and all branches are joined with the `concat` filter in input
//! order. The result is encoded in the same pass with the configured codec
//! pair, so there are no intermediate segment files to clean up.
//!
//! Progress is reported to an [`EncoderProgressSink`] as ticks on the
//! [`TIMELINE_BAR`] (seconds rendered out of the total timeline length) and
//! the [`FRAME_BAR`] (frames written out of the expected frame count).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use autocut_models::{total_duration, EncodingConfig, SegmentProposal};

use crate::command::{EncodeCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{build_concat_filter, FrameFormat, OUT_AUDIO, OUT_VIDEO};
use crate::probe::{probe_video, VideoInfo};
use crate::tracker::{EncoderProgressSink, FRAME_BAR, TIMELINE_BAR};

/// Result of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembledOutput {
    /// Encoded output file
    pub path: PathBuf,
    /// Duration of the output as probed after encoding
    pub duration: f64,
    /// Number of segments concatenated
    pub segment_count: usize,
}

/// Media operations the pipeline needs.
#[async_trait]
pub trait MediaRenderer: Send + Sync {
    /// Duration of a local media file in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Concatenate `segments` of `source` into `output`.
    async fn assemble(
        &self,
        source: &Path,
        segments: &[SegmentProposal],
        output: &Path,
        sink: Arc<dyn EncoderProgressSink>,
    ) -> MediaResult<AssembledOutput>;
}

/// FFmpeg-backed [`MediaRenderer`].
#[derive(Debug, Clone, Default)]
pub struct ClipAssembler {
    encoding: EncodingConfig,
    timeout_secs: Option<u64>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl ClipAssembler {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            encoding,
            timeout_secs: None,
            cancel_rx: None,
        }
    }

    /// Kill the encoder if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Kill the encoder when `cancel_rx` flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn frame_format(&self, info: &VideoInfo) -> FrameFormat {
        FrameFormat::new(
            self.encoding.width.unwrap_or(info.width),
            self.encoding.height.unwrap_or(info.height),
            self.encoding.fps.unwrap_or(info.fps),
        )
    }

    /// Build the single-pass extract + concat + encode command.
    pub fn build_command(
        &self,
        source: &Path,
        segments: &[SegmentProposal],
        output: &Path,
        format: FrameFormat,
        with_audio: bool,
    ) -> EncodeCommand {
        let filter = build_concat_filter(segments, format, with_audio);
        let encoding = &self.encoding;

        let cmd = EncodeCommand::new(source, output)
            .filter_graph(filter)
            .map(OUT_VIDEO)
            .video(&encoding.codec, &encoding.preset, encoding.crf);
        if with_audio {
            cmd.map(OUT_AUDIO)
                .audio(&encoding.audio_codec, &encoding.audio_bitrate)
        } else {
            cmd.no_audio()
        }
    }

    fn runner(&self) -> FfmpegRunner {
        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        if let Some(rx) = &self.cancel_rx {
            runner = runner.with_cancel(rx.clone());
        }
        runner
    }
}

#[async_trait]
impl MediaRenderer for ClipAssembler {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        let info = probe_video(path).await?;
        if info.duration <= 0.0 {
            return Err(MediaError::invalid_video(format!(
                "{} has no measurable duration",
                path.display()
            )));
        }
        Ok(info.duration)
    }

    async fn assemble(
        &self,
        source: &Path,
        segments: &[SegmentProposal],
        output: &Path,
        sink: Arc<dyn EncoderProgressSink>,
    ) -> MediaResult<AssembledOutput> {
        if segments.is_empty() {
            return Err(MediaError::EmptyTimeline);
        }

        let info = probe_video(source).await?;
        let format = self.frame_format(&info);
        let timeline_secs = total_duration(segments);
        let total_frames = (timeline_secs * format.fps).round();

        info!(
            source = %source.display(),
            output = %output.display(),
            segments = segments.len(),
            timeline_secs = timeline_secs,
            has_audio = info.has_audio,
            "Assembling highlight timeline"
        );

        let cmd = self.build_command(source, segments, output, format, info.has_audio);

        let progress_sink = Arc::clone(&sink);
        self.runner()
            .run(&cmd, move |progress| {
                let rendered = if progress.finished {
                    timeline_secs
                } else {
                    progress.rendered_secs.min(timeline_secs)
                };
                progress_sink.on_bar_update(TIMELINE_BAR, "index", rendered, timeline_secs);
                progress_sink.on_bar_update(
                    FRAME_BAR,
                    "index",
                    progress.frame as f64,
                    total_frames,
                );
            })
            .await?;

        let duration = probe_video(output).await?.duration;
        debug!(
            output = %output.display(),
            duration = duration,
            "Assembly finished"
        );

        Ok(AssembledOutput {
            path: output.to_path_buf(),
            duration,
            segment_count: segments.len(),
        })
    }
}
