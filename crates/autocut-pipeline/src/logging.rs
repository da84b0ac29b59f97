//! Structured run logging.
//!
//! Every line carries the run ID and the source file name, so concurrent
//! runs can be told apart in JSON output.

use std::path::Path;

use tracing::{error, info, warn, Span};

use autocut_models::{PipelineState, RunId};

#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    source: String,
}

impl RunLogger {
    pub fn new(run_id: &RunId, source: &Path) -> Self {
        Self {
            run_id: run_id.to_string(),
            source: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string()),
        }
    }

    pub fn started(&self, target_secs: f64) {
        info!(run_id = %self.run_id, source = %self.source, target_secs, "Run started");
    }

    pub fn stage(&self, state: PipelineState) {
        info!(run_id = %self.run_id, stage = state.as_str(), "Entering stage");
    }

    pub fn completed(&self, output: &Path, duration: f64) {
        info!(
            run_id = %self.run_id,
            output = %output.display(),
            duration_secs = duration,
            "Run completed"
        );
    }

    pub fn failed(&self, stage: PipelineState, message: &str) {
        error!(run_id = %self.run_id, stage = stage.as_str(), "Run failed: {}", message);
    }

    pub fn cleanup_incomplete(&self, what: &str) {
        warn!(run_id = %self.run_id, "Cleanup incomplete: {}", what);
    }

    /// Span covering the whole run.
    pub fn span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, source = %self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_is_file_name() {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, Path::new("/videos/match day.mp4"));

        assert_eq!(logger.run_id, run_id.to_string());
        assert_eq!(logger.source, "match day.mp4");
    }
}
