//! Segment proposal parsing.
//!
//! Model output is untrusted. It is decoded against a strict schema (an
//! array of `{start, end, reason?}` objects, unknown fields rejected), then
//! every range is clamped to the source bounds and degenerate ranges are
//! dropped. Input order is preserved.

use serde::Deserialize;
use tracing::debug;

use autocut_models::segment::DEFAULT_REASON;
use autocut_models::SegmentProposal;

use crate::error::{PipelineError, PipelineResult};

/// Segments this short or shorter (after clamping) are dropped.
pub const MIN_SEGMENT_SECS: f64 = 0.5;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    reason: Option<String>,
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("json") that may follow the opening fence.
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse raw model output into validated segments for a source of
/// `source_duration` seconds.
///
/// Fails with `MalformedOutput` when the text does not decode and with
/// `NoUsableSegments` when nothing survives validation.
pub fn parse_proposals(raw: &str, source_duration: f64) -> PipelineResult<Vec<SegmentProposal>> {
    let body = strip_fences(raw);
    let decoded: Vec<RawSegment> =
        serde_json::from_str(body).map_err(|e| PipelineError::malformed_output(e.to_string()))?;

    let total = decoded.len();
    let segments: Vec<SegmentProposal> = decoded
        .into_iter()
        .filter_map(|raw| sanitize(raw, source_duration))
        .collect();

    debug!(
        proposed = total,
        accepted = segments.len(),
        source_duration = source_duration,
        "Parsed segment proposals"
    );

    if segments.is_empty() {
        return Err(PipelineError::NoUsableSegments);
    }
    Ok(segments)
}

fn sanitize(raw: RawSegment, source_duration: f64) -> Option<SegmentProposal> {
    let start = raw.start.max(0.0);
    let end = raw.end.min(source_duration);
    if end - start <= MIN_SEGMENT_SECS {
        return None;
    }

    let reason = raw
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REASON.to_string());

    Some(SegmentProposal::new(start, end, reason))
}
