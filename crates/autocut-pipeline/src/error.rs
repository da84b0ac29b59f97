//! Pipeline error types.

use std::time::Duration;

use thiserror::Error;

use autocut_analysis::AnalysisError;
use autocut_media::MediaError;
use autocut_models::PipelineState;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing or invalid API credential: {0}")]
    Credential(String),

    #[error("Could not reach the analysis service: {0}")]
    Transport(String),

    #[error("The analysis service could not process the video ({0})")]
    RemoteProcessingFailure(String),

    #[error("The video was not ready after {0:?}")]
    ReadyTimeout(Duration),

    #[error("No available analysis model supports content generation")]
    NoEligibleModel,

    #[error("Model {model} failed: {message}")]
    ModelInvocation { model: String, message: String },

    #[error("The model returned output that is not a valid segment list: {0}")]
    MalformedOutput(String),

    #[error("The model proposed no usable segments")]
    NoUsableSegments,

    #[error("Nothing to assemble: {0}")]
    Assembly(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure tagged with the state it occurred in.
    #[error("{state} failed: {source}")]
    Stage {
        state: PipelineState,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn malformed_output(msg: impl Into<String>) -> Self {
        Self::MalformedOutput(msg.into())
    }

    /// Tag the error with `state`. Already tagged errors keep their state.
    pub fn at(self, state: PipelineState) -> Self {
        match self {
            tagged @ PipelineError::Stage { .. } => tagged,
            other => PipelineError::Stage {
                state,
                source: Box::new(other),
            },
        }
    }

    /// State the error was raised in, if tagged.
    pub fn stage(&self) -> Option<PipelineState> {
        match self {
            PipelineError::Stage { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// The underlying error without the stage tag.
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Failures the user is expected to fix by resubmitting.
    pub fn is_user_retryable(&self) -> bool {
        matches!(
            self.root(),
            PipelineError::MalformedOutput(_) | PipelineError::NoUsableSegments
        )
    }

    /// Stage-prefixed message for display.
    pub fn user_message(&self) -> String {
        let message = self.root().to_string();
        let mut out = match self.stage() {
            Some(state) => format!("[{}] {}", state, message),
            None => message,
        };
        if self.is_user_retryable() {
            out.push_str(" (please try again, optionally with adjusted instructions)");
        }
        out
    }
}

impl From<AnalysisError> for PipelineError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::Credential(msg) => PipelineError::Credential(msg),
            AnalysisError::RemoteProcessingFailed(id) => PipelineError::RemoteProcessingFailure(id),
            AnalysisError::NoEligibleModel => PipelineError::NoEligibleModel,
            AnalysisError::ModelInvocation { model, message } => {
                PipelineError::ModelInvocation { model, message }
            }
            AnalysisError::ReadyTimeout(waited) => PipelineError::ReadyTimeout(waited),
            AnalysisError::Cancelled => PipelineError::Cancelled,
            AnalysisError::Io(e) => PipelineError::Io(e),
            other => PipelineError::Transport(other.to_string()),
        }
    }
}

impl From<MediaError> for PipelineError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::EmptyTimeline => PipelineError::Assembly(e.to_string()),
            MediaError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Render(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tagging() {
        let err = PipelineError::NoUsableSegments.at(PipelineState::Parsing);
        assert_eq!(err.stage(), Some(PipelineState::Parsing));

        let retagged = err.at(PipelineState::Assembling);
        assert_eq!(retagged.stage(), Some(PipelineState::Parsing));
        assert!(matches!(retagged.root(), PipelineError::NoUsableSegments));
    }

    #[test]
    fn test_user_retryable_classification() {
        assert!(PipelineError::malformed_output("x").is_user_retryable());
        assert!(PipelineError::NoUsableSegments
            .at(PipelineState::Parsing)
            .is_user_retryable());
        assert!(!PipelineError::Render("boom".into()).is_user_retryable());
        assert!(!PipelineError::NoEligibleModel.is_user_retryable());
    }

    #[test]
    fn test_user_message_prefix() {
        let err = PipelineError::malformed_output("expected value").at(PipelineState::Parsing);
        let message = err.user_message();
        assert!(message.starts_with("[parsing] "));
        assert!(message.contains("expected value"));
        assert!(message.contains("try again"));

        let err = PipelineError::NoEligibleModel.at(PipelineState::SelectingModel);
        assert!(!err.user_message().contains("try again"));
    }

    #[test]
    fn test_from_analysis_error() {
        assert!(matches!(
            PipelineError::from(AnalysisError::credential("missing")),
            PipelineError::Credential(_)
        ));
        assert!(matches!(
            PipelineError::from(AnalysisError::transport("reset")),
            PipelineError::Transport(_)
        ));
        assert!(matches!(
            PipelineError::from(AnalysisError::from_http_status(500, "oops")),
            PipelineError::Transport(_)
        ));
    }

    #[test]
    fn test_missing_key_reads_like_precondition() {
        let err = PipelineError::from(AnalysisError::credential("GEMINI_API_KEY not set"));

        assert!(err.stage().is_none());
        assert!(!err.is_user_retryable());
        assert_eq!(
            err.user_message(),
            "Missing or invalid API credential: GEMINI_API_KEY not set"
        );
    }

    #[test]
    fn test_from_media_error() {
        assert!(matches!(
            PipelineError::from(MediaError::EmptyTimeline),
            PipelineError::Assembly(_)
        ));
        assert!(matches!(
            PipelineError::from(MediaError::Timeout(10)),
            PipelineError::Render(_)
        ));
    }
}
