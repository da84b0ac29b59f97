//! Analysis client error types.

use std::time::Duration;

use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing or invalid API credential: {0}")]
    Credential(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Analysis service returned {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Remote processing failed for {0}")]
    RemoteProcessingFailed(String),

    #[error("No analysis model supports content generation")]
    NoEligibleModel,

    #[error("Model {model} failed: {message}")]
    ModelInvocation { model: String, message: String },

    #[error("Remote file was not ready after {0:?}")]
    ReadyTimeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn model_invocation(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelInvocation {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status to an error.
    ///
    /// 401/403 mean the credential was rejected.
    pub fn from_http_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Credential(format!("HTTP {}: {}", status, message)),
            _ => Self::RequestFailed { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            AnalysisError::from_http_status(403, "denied"),
            AnalysisError::Credential(_)
        ));

        assert!(matches!(
            AnalysisError::from_http_status(401, "no key"),
            AnalysisError::Credential(_)
        ));
        assert!(matches!(
            AnalysisError::from_http_status(503, "busy"),
            AnalysisError::RequestFailed { status: 503, .. }
        ));
    }
}
