//! Content-analysis client for highlight proposals.
//!
//! This crate provides:
//! - The [`AnalysisService`] boundary (upload, status, list models, generate, delete)
//! - A Gemini REST implementation of it ([`GeminiClient`])
//! - [`ContentAnalysisClient`]: upload, bounded readiness polling, generation
//! - Deterministic model selection by keyword priority
//! - The highlight prompt

pub mod client;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod selector;
pub mod service;
pub mod types;

pub use client::{ContentAnalysisClient, PollConfig};
pub use error::{AnalysisError, AnalysisResult};
pub use gemini::{GeminiClient, GeminiConfig};
pub use prompt::build_highlight_prompt;
pub use selector::{select_model, ModelSelector, DEFAULT_MODEL_PRIORITY};
pub use service::AnalysisService;
