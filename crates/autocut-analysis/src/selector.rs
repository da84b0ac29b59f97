//! Deterministic analysis model selection.

use autocut_models::ModelDescriptor;

use crate::error::{AnalysisError, AnalysisResult};

/// Keywords tried in order when picking a model.
pub const DEFAULT_MODEL_PRIORITY: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-flash",
    "gemini-2.5-pro",
    "gemini-2.0-pro",
    "gemini-1.5-pro",
    "gemini-pro",
];

/// Pick a model from `candidates`.
///
/// Only models that support generation are eligible. Keywords are scanned
/// in order; the first eligible candidate (in candidate order) whose name
/// contains the keyword wins. With no keyword match the first eligible
/// candidate is returned.
pub fn select_model<S: AsRef<str>>(
    candidates: &[ModelDescriptor],
    keywords: &[S],
) -> AnalysisResult<ModelDescriptor> {
    let eligible: Vec<&ModelDescriptor> =
        candidates.iter().filter(|m| m.supports_generation).collect();

    let first = *eligible.first().ok_or(AnalysisError::NoEligibleModel)?;

    let chosen = keywords
        .iter()
        .find_map(|keyword| {
            eligible
                .iter()
                .find(|m| m.name.contains(keyword.as_ref()))
                .copied()
        })
        .unwrap_or(first);

    Ok(chosen.clone())
}

/// Model selector with a configured priority list.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    priority: Vec<String>,
}

impl ModelSelector {
    pub fn new(priority: Vec<String>) -> Self {
        Self { priority }
    }

    pub fn select(&self, candidates: &[ModelDescriptor]) -> AnalysisResult<ModelDescriptor> {
        select_model(candidates, &self.priority)
    }
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_PRIORITY.iter().map(|s| s.to_string()).collect())
    }
}
