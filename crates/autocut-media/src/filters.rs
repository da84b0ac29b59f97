//! FFmpeg filter graphs for segment concatenation.
//!
//! Every segment is cut from the single source input with `trim`/`atrim`,
//! then normalized to one frame size, frame rate, pixel format and audio
//! layout so the `concat` filter always sees matching streams.

use autocut_models::SegmentProposal;

/// Label of the concatenated video stream.
pub const OUT_VIDEO: &str = "[outv]";
/// Label of the concatenated audio stream.
pub const OUT_AUDIO: &str = "[outa]";

/// Audio sample rate every segment is resampled to.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// Output geometry shared by all segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl FrameFormat {
    /// Build a format usable by yuv420p encoders (even dimensions, sane rate).
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width: even(width.max(2)),
            height: even(height.max(2)),
            fps: if fps.is_finite() && fps > 0.0 { fps } else { 30.0 },
        }
    }
}

fn even(value: u32) -> u32 {
    value - value % 2
}

/// Video chain for one segment: cut, reset timestamps, fit into the frame.
pub fn segment_video_chain(index: usize, segment: &SegmentProposal, format: FrameFormat) -> String {
    format!(
        "[0:v]trim=start={start:.3}:end={end:.3},setpts=PTS-STARTPTS,\
         scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps:.3},format=yuv420p[v{index}]",
        start = segment.start,
        end = segment.end,
        w = format.width,
        h = format.height,
        fps = format.fps,
    )
}

/// Audio chain for one segment: cut, reset timestamps, common layout.
pub fn segment_audio_chain(index: usize, segment: &SegmentProposal) -> String {
    format!(
        "[0:a]atrim=start={start:.3}:end={end:.3},asetpts=PTS-STARTPTS,\
         aformat=sample_rates={rate}:channel_layouts=stereo[a{index}]",
        start = segment.start,
        end = segment.end,
        rate = AUDIO_SAMPLE_RATE,
    )
}

/// Complete `-filter_complex` graph concatenating `segments` in order.
///
/// Produces [`OUT_VIDEO`], plus [`OUT_AUDIO`] when `with_audio` is set.
pub fn build_concat_filter(
    segments: &[SegmentProposal],
    format: FrameFormat,
    with_audio: bool,
) -> String {
    let mut chains = Vec::with_capacity(segments.len() * 2 + 1);
    let mut concat_inputs = String::new();

    for (i, segment) in segments.iter().enumerate() {
        chains.push(segment_video_chain(i, segment, format));
        concat_inputs.push_str(&format!("[v{}]", i));

        if with_audio {
            chains.push(segment_audio_chain(i, segment));
            concat_inputs.push_str(&format!("[a{}]", i));
        }
    }

    let concat = if with_audio {
        format!(
            "{}concat=n={}:v=1:a=1{}{}",
            concat_inputs,
            segments.len(),
            OUT_VIDEO,
            OUT_AUDIO
        )
    } else {
        format!(
            "{}concat=n={}:v=1:a=0{}",
            concat_inputs,
            segments.len(),
            OUT_VIDEO
        )
    };
    chains.push(concat);

    chains.join(";")
}
