//! Highlight pipeline.
//!
//! This crate provides:
//! - The segment proposal parser
//! - The run orchestrator (state machine, events, cleanup)
//! - Per-run temporary workspaces
//! - Configuration, run logging and metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod parser;
pub mod workspace;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::RunLogger;
pub use orchestrator::{PipelineOrchestrator, PipelineRun, RunOutcome};
pub use parser::parse_proposals;
pub use workspace::RunWorkspace;
