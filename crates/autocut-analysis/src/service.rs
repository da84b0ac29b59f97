//! The analysis service boundary.

use std::path::Path;

use async_trait::async_trait;

use autocut_models::{ModelDescriptor, RemoteMediaHandle, RemoteState};

use crate::error::AnalysisResult;

/// Remote content-analysis service.
///
/// Implementations only talk to the service; they never touch local files
/// other than the path passed to [`AnalysisService::upload`].
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Fail fast when no usable credential is configured.
    fn ensure_credentials(&self) -> AnalysisResult<()> {
        Ok(())
    }

    /// Upload a local media file.
    async fn upload(&self, path: &Path) -> AnalysisResult<RemoteMediaHandle>;

    /// Current state of an uploaded file.
    async fn get_status(&self, id: &str) -> AnalysisResult<RemoteState>;

    /// Models offered by the service, in service order.
    async fn list_models(&self) -> AnalysisResult<Vec<ModelDescriptor>>;

    /// Run `model` over the uploaded file with `prompt` and return its text.
    async fn generate(
        &self,
        handle: &RemoteMediaHandle,
        prompt: &str,
        model: &str,
    ) -> AnalysisResult<String>;

    /// Delete an uploaded file.
    async fn delete(&self, id: &str) -> AnalysisResult<()>;
}
