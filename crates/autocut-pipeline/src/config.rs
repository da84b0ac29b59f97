//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use autocut_analysis::{PollConfig, DEFAULT_MODEL_PRIORITY};
use autocut_models::EncodingConfig;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for per-run temporary files
    pub work_dir: PathBuf,
    /// Directory the finished output is moved into
    pub output_dir: PathBuf,
    /// Delay between remote readiness checks
    pub poll_interval: Duration,
    /// Longest wait for the remote file to become ready
    pub max_ready_wait: Duration,
    /// Encoder timeout
    pub render_timeout: Duration,
    /// Delay before the single retry of a failed temp-file removal
    pub cleanup_retry_delay: Duration,
    /// Capacity of the event channel handed to subscribers
    pub event_channel_capacity: usize,
    /// Model keywords, most preferred first
    pub model_priority: Vec<String>,
    /// Output encoding
    pub encoding: EncodingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("autocut"),
            output_dir: PathBuf::from("."),
            poll_interval: Duration::from_secs(5),
            max_ready_wait: Duration::from_secs(600), // 10 minutes
            render_timeout: Duration::from_secs(1800),
            cleanup_retry_delay: Duration::from_millis(1000),
            event_channel_capacity: 64,
            model_priority: default_priority(),
            encoding: EncodingConfig::default(),
        }
    }
}

fn default_priority() -> Vec<String> {
    DEFAULT_MODEL_PRIORITY.iter().map(|s| s.to_string()).collect()
}

/// Parse a comma-separated keyword list, ignoring blanks.
fn parse_priority(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            work_dir: std::env::var("AUTOCUT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("AUTOCUT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            poll_interval: Duration::from_secs(
                std::env::var("AUTOCUT_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            max_ready_wait: Duration::from_secs(
                std::env::var("AUTOCUT_MAX_READY_WAIT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            render_timeout: Duration::from_secs(
                std::env::var("AUTOCUT_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            cleanup_retry_delay: Duration::from_millis(
                std::env::var("AUTOCUT_CLEANUP_RETRY_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            event_channel_capacity: std::env::var("AUTOCUT_PROGRESS_CHANNEL_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(64),
            model_priority: std::env::var("AUTOCUT_MODEL_PRIORITY")
                .ok()
                .map(|raw| parse_priority(&raw))
                .filter(|list| !list.is_empty())
                .unwrap_or(defaults.model_priority),
            encoding: defaults.encoding,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.poll_interval,
            max_wait: self.max_ready_wait,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_ready_wait, Duration::from_secs(600));
        assert_eq!(config.model_priority.first().map(String::as_str), Some("gemini-2.5-flash"));
        assert_eq!(config.poll_config().max_wait, config.max_ready_wait);
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(
            parse_priority(" gemini-2.0-flash, ,gemini-pro "),
            vec!["gemini-2.0-flash".to_string(), "gemini-pro".to_string()]
        );
        assert!(parse_priority(" , ").is_empty());
    }
}
