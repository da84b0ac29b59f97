//! Output encoding settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Codec pair and quality used for every assembled cut.
///
/// Frame size and rate follow the source unless overridden; all segments are
/// scaled to the same format before they are joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EncodingConfig {
    pub codec: String,
    /// x264 speed preset
    pub preset: String,
    /// 0-51, lower is better
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".into(),
            preset: "ultrafast".into(),
            crf: 23,
            audio_codec: "aac".into(),
            audio_bitrate: "128k".into(),
            width: None,
            height: None,
            fps: None,
        }
    }
}
