//! Highlight segment models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reason shown when the analysis service gave none.
pub const DEFAULT_REASON: &str = "highlight";

/// A validated highlight segment of the source video, in seconds.
///
/// Segments are only built by the proposal parser, after clamping against
/// the source duration, so `end > start` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentProposal {
    /// Start offset in seconds (>= 0)
    pub start: f64,

    /// End offset in seconds (> start, <= source duration)
    pub end: f64,

    /// Why the service picked this range
    pub reason: String,
}

impl SegmentProposal {
    /// Create a new segment.
    pub fn new(start: f64, end: f64, reason: impl Into<String>) -> Self {
        Self {
            start,
            end,
            reason: reason.into(),
        }
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// One report line, e.g. ``- `2s` ~ `6s` (4.0s): intro``.
    pub fn describe(&self) -> String {
        format!(
            "- `{}s` ~ `{}s` ({:.1}s): {}",
            trim_seconds(self.start),
            trim_seconds(self.end),
            self.duration(),
            self.reason
        )
    }
}

/// Sum of all segment durations.
pub fn total_duration(segments: &[SegmentProposal]) -> f64 {
    segments.iter().map(SegmentProposal::duration).sum()
}

/// Human-readable list of accepted segments followed by the estimated total.
pub fn format_decision_report(segments: &[SegmentProposal]) -> String {
    let mut lines: Vec<String> = segments.iter().map(SegmentProposal::describe).collect();
    lines.push(format!(
        "Estimated total duration: {:.1}s",
        total_duration(segments)
    ));
    lines.join("\n")
}

/// Print whole seconds without a trailing `.0`.
fn trim_seconds(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
