//! Gemini REST client.
//!
//! Implements [`AnalysisService`] over the Generative Language API:
//! resumable upload to the Files API, file status and deletion, model
//! listing, and `generateContent` with a file reference.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info};

use autocut_models::{ModelDescriptor, RemoteMediaHandle, RemoteState};

use crate::error::{AnalysisError, AnalysisResult};
use crate::service::AnalysisService;
use crate::types::{
    Content, FileData, FileResource, GenerateRequest, GenerateResponse, GenerationConfig,
    ListModelsResponse, Part, UploadFileMetadata, UploadResponse, UploadStartRequest,
};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const MODELS_PAGE_SIZE: u32 = 100;

/// Configuration for the Gemini client.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// Base URL of the API (no trailing slash)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> AnalysisResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| AnalysisError::credential("GEMINI_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(secs) = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client; an empty API key is rejected up front.
    pub fn new(config: GeminiConfig) -> AnalysisResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AnalysisError::credential("API key is empty"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AnalysisError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> AnalysisResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.config.base_url, path)
    }

    /// Model resource path ("models/<id>") for a bare or prefixed name.
    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    /// Turn a non-success response into an error, keeping the body.
    async fn check(response: Response) -> AnalysisResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AnalysisError::from_http_status(status, body))
    }

    /// Network failures without the request URL (which may carry secrets).
    fn transport(context: &str, e: reqwest::Error) -> AnalysisError {
        AnalysisError::transport(format!("{}: {}", context, e.without_url()))
    }

    async fn start_upload(&self, display_name: &str, size: usize, mime: &str) -> AnalysisResult<String> {
        let url = format!("{}/upload/v1beta/files", self.config.base_url);
        let request = UploadStartRequest {
            file: UploadFileMetadata {
                display_name: display_name.to_string(),
            },
        };

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport("upload start failed", e))?;
        let response = Self::check(response).await?;

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AnalysisError::invalid_response("upload start returned no upload URL"))
    }
}

/// MIME type for a source video by extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "video/mp4",
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    fn ensure_credentials(&self) -> AnalysisResult<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(AnalysisError::credential("API key is empty"));
        }
        Ok(())
    }

    async fn upload(&self, path: &Path) -> AnalysisResult<RemoteMediaHandle> {
        let bytes = tokio::fs::read(path).await?;
        let mime = mime_type_for(path);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string());

        info!(
            file = %display_name,
            bytes = bytes.len(),
            mime = mime,
            "Uploading source video"
        );

        let upload_url = self.start_upload(&display_name, bytes.len(), mime).await?;

        let response = self
            .http
            .post(&upload_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Self::transport("upload failed", e))?;
        let response = Self::check(response).await?;

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::invalid_response(format!("upload response: {}", e)))?;

        debug!(id = %uploaded.file.name, "Upload finalized");
        Ok(uploaded.file.into_handle())
    }

    async fn get_status(&self, id: &str) -> AnalysisResult<RemoteState> {
        let response = self
            .http
            .get(self.api_url(id))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| Self::transport("status request failed", e))?;
        let response = Self::check(response).await?;

        let file: FileResource = response
            .json()
            .await
            .map_err(|e| AnalysisError::invalid_response(format!("file status: {}", e)))?;
        Ok(file.remote_state())
    }

    async fn list_models(&self) -> AnalysisResult<Vec<ModelDescriptor>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.api_url("models"))
                .header(API_KEY_HEADER, &self.config.api_key)
                .query(&[("pageSize", MODELS_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Self::transport("model listing failed", e))?;
            let response = Self::check(response).await?;
            let page: ListModelsResponse = response
                .json()
                .await
                .map_err(|e| AnalysisError::invalid_response(format!("model list: {}", e)))?;

            models.extend(
                page.models
                    .into_iter()
                    .map(|m| ModelDescriptor::from_methods(m.name, &m.supported_generation_methods)),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = models.len(), "Listed analysis models");
        Ok(models)
    }

    async fn generate(
        &self,
        handle: &RemoteMediaHandle,
        prompt: &str,
        model: &str,
    ) -> AnalysisResult<String> {
        let url = self.api_url(&format!("{}:generateContent", Self::model_path(model)));

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            mime_type: handle.mime_type.clone(),
                            file_uri: handle.uri.clone(),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport("generate request failed", e))?;
        let response = Self::check(response).await?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::invalid_response(format!("generate response: {}", e)))?;

        generated
            .text()
            .ok_or_else(|| AnalysisError::invalid_response("No content in Gemini response"))
    }

    async fn delete(&self, id: &str) -> AnalysisResult<()> {
        let response = self
            .http
            .delete(self.api_url(id))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| Self::transport("delete request failed", e))?;
        Self::check(response).await?;
        Ok(())
    }
}
