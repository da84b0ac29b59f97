//! Highlight-selection prompt.

/// Fewest segments the model is asked for.
pub const MIN_SEGMENTS: usize = 3;
/// Most segments the model is asked for.
pub const MAX_SEGMENTS: usize = 8;
/// Allowed deviation of the total from the target, in seconds.
pub const DURATION_TOLERANCE_SECS: f64 = 10.0;

/// Build the prompt sent alongside the uploaded video.
pub fn build_highlight_prompt(instructions: &str, target_duration: f64) -> String {
    format!(
        r#"You are a professional video editor. Watch the attached video and choose the segments to keep.

Editing instructions: {instructions}

Requirements:
- Choose between {min} and {max} segments.
- The segments must not overlap.
- The total duration of all segments must be within {tolerance:.0} seconds of {target:.0} seconds.
- Times are in seconds from the start of the video.

Respond with ONLY a JSON array, no markdown and no commentary. Each element must be an object with exactly these fields:
- "start": number
- "end": number
- "reason": string explaining why the segment was chosen

Example:
[{{"start": 12.5, "end": 18.0, "reason": "opening goal"}}]"#,
        instructions = instructions.trim(),
        min = MIN_SEGMENTS,
        max = MAX_SEGMENTS,
        tolerance = DURATION_TOLERANCE_SECS,
        target = target_duration,
    )
}
