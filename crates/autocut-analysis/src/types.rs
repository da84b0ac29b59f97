//! Gemini REST wire types.

use serde::{Deserialize, Serialize};

use autocut_models::{RemoteMediaHandle, RemoteState};

/// File resource returned by the Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    /// Resource name, e.g. "files/abc123"
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl FileResource {
    pub fn remote_state(&self) -> RemoteState {
        parse_file_state(self.state.as_deref())
    }

    pub fn into_handle(self) -> RemoteMediaHandle {
        let state = self.remote_state();
        RemoteMediaHandle::new(self.name, self.uri, self.mime_type, state)
    }
}

/// Map a Files API state to a remote state.
///
/// Anything other than ACTIVE or FAILED is still being processed.
pub fn parse_file_state(state: Option<&str>) -> RemoteState {
    match state {
        Some("ACTIVE") => RemoteState::Ready,
        Some("FAILED") => RemoteState::Failed,
        _ => RemoteState::Pending,
    }
}

/// Finalize response of a resumable upload.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub file: FileResource,
}

/// Resumable upload start request.
#[derive(Debug, Serialize)]
pub struct UploadStartRequest {
    pub file: UploadFileMetadata,
}

#[derive(Debug, Serialize)]
pub struct UploadFileMetadata {
    pub display_name: String,
}

/// One page of model listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelResource>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResource {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

/// generateContent request.
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
pub struct FileData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "fileUri")]
    pub file_uri: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: String,
}

/// generateContent response.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_state() {
        assert_eq!(parse_file_state(Some("ACTIVE")), RemoteState::Ready);
        assert_eq!(parse_file_state(Some("FAILED")), RemoteState::Failed);
        assert_eq!(parse_file_state(Some("PROCESSING")), RemoteState::Pending);
        assert_eq!(parse_file_state(Some("STATE_UNSPECIFIED")), RemoteState::Pending);
        assert_eq!(parse_file_state(None), RemoteState::Pending);
    }

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            mime_type: "video/mp4".to_string(),
                            file_uri: "https://x/files/abc".to_string(),
                        },
                    },
                    Part::Text {
                        text: "pick".to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["fileData"]["fileUri"], "https://x/files/abc");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "pick");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[{\"start\":1,"},{"text":"\"end\":3}]"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().unwrap(), r#"[{"start":1,"end":3}]"#);

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }
}
