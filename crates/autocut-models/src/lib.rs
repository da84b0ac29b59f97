//! Shared data models for the autocut highlight pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Highlight segment proposals
//! - Remote media handles and analysis model descriptors
//! - Encoding configuration
//! - Pipeline runs, states and progress events

pub mod encoding;
pub mod event;
pub mod model;
pub mod remote;
pub mod request;
pub mod run;
pub mod segment;

pub use encoding::EncodingConfig;
pub use event::{PipelineEvent, RenderProgressState};
pub use model::ModelDescriptor;
pub use remote::{RemoteMediaHandle, RemoteState, StateTransitionError};
pub use request::EditRequest;
pub use run::{PipelineState, RunId};
pub use segment::{format_decision_report, total_duration, SegmentProposal};
