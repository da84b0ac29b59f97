//! Pipeline run identity and state machine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one pipeline run.
///
/// Used to scope temporary paths so concurrent runs never share files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orchestrator states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Init,
    Uploading,
    AwaitingRemoteReady,
    SelectingModel,
    Analyzing,
    Parsing,
    Assembling,
    Done,
    Error,
    Cleanup,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Init => "init",
            PipelineState::Uploading => "uploading",
            PipelineState::AwaitingRemoteReady => "awaiting_remote_ready",
            PipelineState::SelectingModel => "selecting_model",
            PipelineState::Analyzing => "analyzing",
            PipelineState::Parsing => "parsing",
            PipelineState::Assembling => "assembling",
            PipelineState::Done => "done",
            PipelineState::Error => "error",
            PipelineState::Cleanup => "cleanup",
        }
    }

    /// User-facing banner for the stage, if it has one.
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            PipelineState::Uploading => Some("Stage 1/4: sending the video to the analysis service"),
            PipelineState::AwaitingRemoteReady => {
                Some("Stage 2/4: waiting for the service to finish processing the video")
            }
            PipelineState::Analyzing => {
                Some("Stage 3/4: picking the best segments for your instructions and length")
            }
            PipelineState::Assembling => Some("Stage 4/4: rendering the edited video"),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
