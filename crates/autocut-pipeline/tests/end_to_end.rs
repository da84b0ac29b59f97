//! Full pipeline over a real FFmpeg render with a scripted analysis service.
//!
//! Ignored by default; run with `cargo test -- --ignored` where `ffmpeg` and
//! `ffprobe` are on PATH. A missing binary fails the test instead of skipping.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use autocut_analysis::{AnalysisResult, AnalysisService};
use autocut_media::{check_ffmpeg, check_ffprobe, get_duration, ClipAssembler};
use autocut_models::{
    EditRequest, EncodingConfig, ModelDescriptor, PipelineEvent, PipelineState, RemoteMediaHandle,
    RemoteState,
};
use autocut_pipeline::{PipelineConfig, PipelineError, PipelineOrchestrator};

struct ScriptedService {
    response: String,
    polls: Mutex<u32>,
    deleted: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            polls: Mutex::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn upload(&self, _path: &Path) -> AnalysisResult<RemoteMediaHandle> {
        Ok(RemoteMediaHandle::new(
            "files/e2e",
            "https://example.test/files/e2e",
            "video/mp4",
            RemoteState::Pending,
        ))
    }

    async fn get_status(&self, _id: &str) -> AnalysisResult<RemoteState> {
        let mut polls = self.polls.lock().unwrap();
        *polls += 1;
        Ok(if *polls >= 2 {
            RemoteState::Ready
        } else {
            RemoteState::Pending
        })
    }

    async fn list_models(&self) -> AnalysisResult<Vec<ModelDescriptor>> {
        Ok(vec![
            ModelDescriptor::new("models/gemini-1.5-pro", true),
            ModelDescriptor::new("models/gemini-2.5-flash", true),
        ])
    }

    async fn generate(
        &self,
        _handle: &RemoteMediaHandle,
        _prompt: &str,
        _model: &str,
    ) -> AnalysisResult<String> {
        Ok(self.response.clone())
    }

    async fn delete(&self, id: &str) -> AnalysisResult<()> {
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

fn require_ffmpeg() {
    assert!(
        check_ffmpeg().is_ok() && check_ffprobe().is_ok(),
        "ffmpeg and ffprobe must be on PATH to run this test"
    );
}

async fn make_source(dir: &Path, seconds: u32) -> PathBuf {
    let path = dir.join("match.mp4");
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=320x240:rate=25", seconds),
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={}", seconds),
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-c:a",
            "aac",
            "-shortest",
        ])
        .arg(&path)
        .status()
        .await
        .unwrap();
    assert!(status.success(), "failed to generate test source");
    path
}

fn config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        work_dir: root.join("work"),
        output_dir: root.join("out"),
        poll_interval: Duration::from_millis(10),
        cleanup_retry_delay: Duration::from_millis(10),
        event_channel_capacity: 1024,
        ..Default::default()
    }
}

fn orchestrator(service: Arc<ScriptedService>, config: PipelineConfig) -> PipelineOrchestrator {
    let renderer = ClipAssembler::new(EncodingConfig::default()).with_timeout(120);
    PipelineOrchestrator::new(service, Arc::new(renderer), config)
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_thirty_second_source_to_nine_second_cut() {
    require_ffmpeg();

    let root = TempDir::new().unwrap();
    let source = make_source(root.path(), 30).await;
    let service = Arc::new(ScriptedService::new(
        r#"[{"start":2,"end":6,"reason":"a"},{"start":20,"end":25,"reason":"b"}]"#,
    ));
    let config = config(root.path());
    let orchestrator = orchestrator(service.clone(), config.clone());
    let (tx, mut rx) = orchestrator.event_channel();

    let outcome = orchestrator
        .run(EditRequest::new(&source, "the best bits", 10.0, "final"), tx)
        .await
        .unwrap();

    assert_eq!(outcome.segments.len(), 2);
    assert_eq!(outcome.output_path, config.output_dir.join("final.mp4"));
    assert!((outcome.duration - 9.0).abs() <= 1.0, "duration {}", outcome.duration);
    let probed = get_duration(&outcome.output_path).await.unwrap();
    assert!((probed - 9.0).abs() <= 1.0);

    let mut fractions = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PipelineEvent::Progress(state) = event {
            fractions.push(state.fraction);
        }
    }
    assert_eq!(fractions.first().copied(), Some(0.0));
    assert_eq!(fractions.last().copied(), Some(1.0));
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(*service.deleted.lock().unwrap(), vec!["files/e2e".to_string()]);
    assert!(source.exists());
    assert!(std::fs::read_dir(&config.work_dir).unwrap().next().is_none());
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_malformed_output_removes_temp_input() {
    require_ffmpeg();

    let root = TempDir::new().unwrap();
    let source = make_source(root.path(), 12).await;
    let service = Arc::new(ScriptedService::new("Here are the highlights you asked for!"));
    let config = config(root.path());
    let orchestrator = orchestrator(service, config.clone());
    let (tx, mut rx) = orchestrator.event_channel();

    let err = orchestrator
        .run(EditRequest::new(&source, "", 10.0, ""), tx)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(PipelineState::Parsing));
    assert!(matches!(err.root(), PipelineError::MalformedOutput(_)));

    let mut states = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PipelineEvent::Stage { state, .. } = event {
            states.push(state);
        }
    }
    assert!(states.ends_with(&[
        PipelineState::Parsing,
        PipelineState::Error,
        PipelineState::Cleanup
    ]));
    assert!(std::fs::read_dir(&config.work_dir).unwrap().next().is_none());
    assert!(!config.output_dir.join("gemini_cut.mp4").exists());
}
