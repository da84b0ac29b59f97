//! Remote media handle models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Readiness of an uploaded file on the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemoteState {
    /// Service is still processing the upload
    #[default]
    Pending,
    /// File can be referenced in generation calls
    Ready,
    /// Service gave up on the file
    Failed,
}

impl RemoteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteState::Pending => "pending",
            RemoteState::Ready => "ready",
            RemoteState::Failed => "failed",
        }
    }
}

impl fmt::Display for RemoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state change on a remote handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid remote state transition for {id}: {from} -> {to}")]
pub struct StateTransitionError {
    pub id: String,
    pub from: RemoteState,
    pub to: RemoteState,
}

/// The uploaded source video as known by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RemoteMediaHandle {
    /// Service-side identifier (e.g. "files/abc123")
    pub id: String,

    /// URI used to reference the file in generation requests
    pub uri: String,

    /// MIME type reported by the service
    pub mime_type: String,

    /// Last observed state
    pub state: RemoteState,
}

impl RemoteMediaHandle {
    pub fn new(
        id: impl Into<String>,
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        state: RemoteState,
    ) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            mime_type: mime_type.into(),
            state,
        }
    }

    /// Record a newly observed state.
    ///
    /// Only `Pending -> Ready` and `Pending -> Failed` are accepted; observing
    /// the current state again is a no-op.
    pub fn apply_state(&mut self, next: RemoteState) -> Result<(), StateTransitionError> {
        match (self.state, next) {
            (current, next) if current == next => Ok(()),
            (RemoteState::Pending, RemoteState::Ready | RemoteState::Failed) => {
                self.state = next;
                Ok(())
            }
            (from, to) => Err(StateTransitionError {
                id: self.id.clone(),
                from,
                to,
            }),
        }
    }
}
