//! Analysis model descriptors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Generation method a model must advertise to be usable.
pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

/// A model offered by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModelDescriptor {
    /// Model name as reported by the service (e.g. "models/gemini-2.5-flash")
    pub name: String,

    /// Whether the model supports content generation
    pub supports_generation: bool,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, supports_generation: bool) -> Self {
        Self {
            name: name.into(),
            supports_generation,
        }
    }

    /// Build a descriptor from the service's list of supported methods.
    pub fn from_methods<S: AsRef<str>>(name: impl Into<String>, methods: &[S]) -> Self {
        let supports_generation = methods
            .iter()
            .any(|m| m.as_ref() == GENERATE_CONTENT_METHOD);
        Self::new(name, supports_generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_methods() {
        let model = ModelDescriptor::from_methods(
            "models/gemini-2.5-flash",
            &["countTokens", "generateContent"],
        );
        assert!(model.supports_generation);

        let embed = ModelDescriptor::from_methods("models/text-embedding-004", &["embedContent"]);
        assert!(!embed.supports_generation);
    }
}
