//! Edit request supplied by the caller.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shortest output the caller may ask for, in seconds.
pub const MIN_TARGET_DURATION: f64 = 10.0;

/// Output name used when the caller leaves it blank.
pub const DEFAULT_OUTPUT_NAME: &str = "gemini_cut";

/// Instruction used when the caller leaves it blank.
pub const DEFAULT_INSTRUCTIONS: &str =
    "Pick the most exciting segments of the video with the most stable footage.";

/// One "video + instructions + target length" submission.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditRequest {
    /// Local source video
    pub source_path: PathBuf,

    /// Natural-language editing instruction
    #[serde(default)]
    pub instructions: String,

    /// Requested output length in seconds
    pub target_duration: f64,

    /// File name for the final output (".mp4" is appended when missing)
    #[serde(default)]
    pub output_name: String,
}

impl EditRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        instructions: impl Into<String>,
        target_duration: f64,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            instructions: instructions.into(),
            target_duration,
            output_name: output_name.into(),
        }
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        if self.source_path.as_os_str().is_empty() {
            return Err("Source video path is required".to_string());
        }

        if !self.target_duration.is_finite() || self.target_duration < MIN_TARGET_DURATION {
            return Err(format!(
                "Target duration must be at least {} seconds",
                MIN_TARGET_DURATION
            ));
        }

        Ok(())
    }

    /// Instruction text, falling back to the generic one when blank.
    pub fn effective_instructions(&self) -> &str {
        let trimmed = self.instructions.trim();
        if trimmed.is_empty() {
            DEFAULT_INSTRUCTIONS
        } else {
            trimmed
        }
    }

    /// Final output file name: never blank, always ".mp4", no path separators.
    pub fn output_file_name(&self) -> String {
        let cleaned: String = self
            .output_name
            .trim()
            .chars()
            .filter(|c| !matches!(c, '/' | '\\'))
            .collect();
        let name = if cleaned.is_empty() {
            DEFAULT_OUTPUT_NAME.to_string()
        } else {
            cleaned
        };

        if name.ends_with(".mp4") {
            name
        } else {
            format!("{}.mp4", name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target_duration() {
        assert!(EditRequest::new("in.mp4", "", 10.0, "").validate().is_ok());
        assert!(EditRequest::new("in.mp4", "", 9.5, "").validate().is_err());
        assert!(EditRequest::new("in.mp4", "", f64::NAN, "").validate().is_err());
        assert!(EditRequest::new("", "", 60.0, "").validate().is_err());
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(EditRequest::new("a", "", 60.0, "").output_file_name(), "gemini_cut.mp4");
        assert_eq!(EditRequest::new("a", "", 60.0, "  trip ").output_file_name(), "trip.mp4");
        assert_eq!(EditRequest::new("a", "", 60.0, "trip.mp4").output_file_name(), "trip.mp4");
        assert_eq!(EditRequest::new("a", "", 60.0, "../x/y").output_file_name(), "..xy.mp4");
    }

    #[test]
    fn test_effective_instructions() {
        let blank = EditRequest::new("a", "   ", 60.0, "");
        assert_eq!(blank.effective_instructions(), DEFAULT_INSTRUCTIONS);

        let given = EditRequest::new("a", " cut the jokes ", 60.0, "");
        assert_eq!(given.effective_instructions(), "cut the jokes");
    }
}
