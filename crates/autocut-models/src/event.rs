//! Progress and lifecycle events published by a pipeline run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::run::PipelineState;

/// Current completion of one render operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderProgressState {
    /// Completion in [0, 1]
    pub fraction: f64,
    /// Human-readable phase label
    pub phase: String,
}

impl RenderProgressState {
    pub fn new(fraction: f64, phase: impl Into<String>) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            phase: phase.into(),
        }
    }

    /// Whole percent, for display.
    pub fn percent(&self) -> u8 {
        (self.fraction * 100.0).floor() as u8
    }
}

/// Event envelope sent to the caller's subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Orchestrator entered a new state
    Stage {
        state: PipelineState,
        timestamp: DateTime<Utc>,
    },

    /// Informational message
    Log {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Render progress update
    Progress(RenderProgressState),

    /// Output is ready
    Done {
        output_path: String,
        duration: f64,
    },

    /// Stage failure
    Error {
        stage: PipelineState,
        message: String,
        retryable: bool,
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
    pub fn stage(state: PipelineState) -> Self {
        PipelineEvent::Stage {
            state,
            timestamp: Utc::now(),
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        PipelineEvent::Log {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn progress(fraction: f64, phase: impl Into<String>) -> Self {
        PipelineEvent::Progress(RenderProgressState::new(fraction, phase))
    }

    pub fn done(output_path: impl Into<String>, duration: f64) -> Self {
        PipelineEvent::Done {
            output_path: output_path.into(),
            duration,
        }
    }

    pub fn error(stage: PipelineState, message: impl Into<String>, retryable: bool) -> Self {
        PipelineEvent::Error {
            stage,
            message: message.into(),
            retryable,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamped() {
        assert_eq!(RenderProgressState::new(1.7, "render").fraction, 1.0);
        assert_eq!(RenderProgressState::new(-0.2, "render").fraction, 0.0);
        assert_eq!(RenderProgressState::new(0.456, "render").percent(), 45);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(PipelineEvent::progress(0.5, "render")).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["fraction"], 0.5);

        let json = serde_json::to_value(PipelineEvent::stage(PipelineState::Parsing)).unwrap();
        assert_eq!(json["state"], "parsing");
    }
}
