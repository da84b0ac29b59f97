//! Pipeline orchestration.
//!
//! One run walks the states
//! `Init -> Uploading -> AwaitingRemoteReady -> SelectingModel -> Analyzing
//! -> Parsing -> Assembling -> Done` strictly in order. A failing state is
//! tagged onto the error and moves the run to `Error`. `Cleanup` follows
//! `Done` or `Error` unconditionally: it deletes the uploaded file and the
//! run's temporary files, logging (never returning) any failure.
//!
//! Lifecycle, log and render-progress events are published on the caller's
//! bounded channel. Progress ticks that do not fit are dropped; lifecycle
//! events wait for capacity.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tracing::{debug, Instrument};

use autocut_analysis::{
    build_highlight_prompt, AnalysisService, ContentAnalysisClient, ModelSelector,
};
use autocut_media::{move_file, EncoderProgressSink, MediaRenderer, RenderProgressTracker};
use autocut_models::{
    format_decision_report, EditRequest, PipelineEvent, PipelineState, RemoteMediaHandle,
    RemoteState, RunId, SegmentProposal,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::parser::parse_proposals;
use crate::workspace::RunWorkspace;

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    /// Final output file
    pub output_path: PathBuf,
    /// Probed duration of the output in seconds
    pub duration: f64,
    /// Accepted segments, in assembly order
    pub segments: Vec<SegmentProposal>,
    /// Model that proposed the segments
    pub model: String,
    /// Human-readable list of accepted segments
    pub report: String,
}

/// State of one pipeline run.
///
/// Owns the remote handle and the temporary files until cleanup.
pub struct PipelineRun {
    id: RunId,
    request: EditRequest,
    state: PipelineState,
    history: Vec<PipelineState>,
    remote: Option<RemoteMediaHandle>,
    workspace: RunWorkspace,
    events: mpsc::Sender<PipelineEvent>,
    logger: RunLogger,
    started: Instant,
}

impl PipelineRun {
    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn workspace(&self) -> &RunWorkspace {
        &self.workspace
    }

    /// Uploaded file that has not been deleted yet.
    pub fn remote(&self) -> Option<&RemoteMediaHandle> {
        self.remote.as_ref()
    }

    async fn emit(&self, event: PipelineEvent) {
        if self.events.send(event).await.is_err() {
            debug!(run_id = %self.id, "Event subscriber gone");
        }
    }

    async fn enter(&mut self, state: PipelineState) {
        self.state = state;
        self.history.push(state);
        self.logger.stage(state);
        self.emit(PipelineEvent::stage(state)).await;
        if let Some(banner) = state.banner() {
            self.emit(PipelineEvent::log(banner)).await;
        }
    }
}

/// Tags an error with the state it was raised in.
fn at<E: Into<PipelineError>>(state: PipelineState) -> impl FnOnce(E) -> PipelineError {
    move |e| e.into().at(state)
}

/// Sequences a highlight run over the analysis service and the renderer.
pub struct PipelineOrchestrator {
    analysis: ContentAnalysisClient<dyn AnalysisService>,
    renderer: Arc<dyn MediaRenderer>,
    selector: ModelSelector,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        renderer: Arc<dyn MediaRenderer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            analysis: ContentAnalysisClient::new(service).with_poll_config(config.poll_config()),
            renderer,
            selector: ModelSelector::new(config.model_priority.clone()),
            config,
        }
    }

    /// Abort readiness polling when `cancel_rx` flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.analysis = self.analysis.with_cancel(cancel_rx);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Event channel sized from the configuration, holding at least one event.
    pub fn event_channel(&self) -> (mpsc::Sender<PipelineEvent>, mpsc::Receiver<PipelineEvent>) {
        mpsc::channel(self.config.event_channel_capacity.max(1))
    }

    /// Run the whole pipeline for `request`, cleanup included.
    pub async fn run(
        &self,
        request: EditRequest,
        events: mpsc::Sender<PipelineEvent>,
    ) -> PipelineResult<RunOutcome> {
        let mut run = self.begin(request, events)?;
        let span = run.logger.span();

        async {
            let result = self.execute(&mut run).await;
            self.cleanup(&mut run).await;
            result
        }
        .instrument(span)
        .await
    }

    /// Check preconditions and create a run in `Init`.
    ///
    /// An invalid request or a missing credential is rejected here, before
    /// any state is entered or resource acquired.
    pub fn begin(
        &self,
        request: EditRequest,
        events: mpsc::Sender<PipelineEvent>,
    ) -> PipelineResult<PipelineRun> {
        request.validate().map_err(PipelineError::InvalidRequest)?;
        self.analysis.ensure_credentials()?;

        let id = RunId::new();
        let workspace = RunWorkspace::new(
            &self.config.work_dir,
            &id,
            &request.source_path,
            self.config.cleanup_retry_delay,
        );
        let logger = RunLogger::new(&id, &request.source_path);

        Ok(PipelineRun {
            id,
            request,
            state: PipelineState::Init,
            history: Vec::new(),
            remote: None,
            workspace,
            events,
            logger,
            started: Instant::now(),
        })
    }

    /// Drive `run` to `Done` or `Error`. Does not clean up.
    pub async fn execute(&self, run: &mut PipelineRun) -> PipelineResult<RunOutcome> {
        metrics::record_run_started();
        run.logger.started(run.request.target_duration);

        match self.stages(run).await {
            Ok(outcome) => {
                run.enter(PipelineState::Done).await;
                run.emit(PipelineEvent::done(
                    outcome.output_path.display().to_string(),
                    outcome.duration,
                ))
                .await;
                run.logger.completed(&outcome.output_path, outcome.duration);
                metrics::record_run_completed(run.started.elapsed().as_secs_f64());
                Ok(outcome)
            }
            Err(e) => {
                let failed_in = e.stage().unwrap_or(run.state);
                run.logger.failed(failed_in, &e.to_string());
                run.enter(PipelineState::Error).await;
                run.emit(PipelineEvent::error(
                    failed_in,
                    e.user_message(),
                    e.is_user_retryable(),
                ))
                .await;
                metrics::record_run_failed(failed_in.as_str());
                Err(e)
            }
        }
    }

    async fn stages(&self, run: &mut PipelineRun) -> PipelineResult<RunOutcome> {
        use PipelineState::*;

        // Init: stage the source and measure it.
        run.enter(Init).await;
        let stage_start = Instant::now();
        run.workspace
            .stage_input(&run.request.source_path)
            .await
            .map_err(at(Init))?;
        let source_duration = self
            .renderer
            .probe_duration(run.workspace.input_path())
            .await
            .map_err(|e| {
                PipelineError::InvalidRequest(format!("unreadable source video: {}", e)).at(Init)
            })?;
        if run.request.instructions.trim().is_empty() {
            run.emit(PipelineEvent::log("No instructions given, using the default highlight instruction"))
                .await;
        }
        metrics::record_stage_duration(Init.as_str(), stage_start.elapsed().as_secs_f64());

        // Uploading
        run.enter(Uploading).await;
        let stage_start = Instant::now();
        let mut handle = self
            .analysis
            .upload(run.workspace.input_path())
            .await
            .map_err(at(Uploading))?;
        run.remote = Some(handle.clone());
        metrics::record_stage_duration(Uploading.as_str(), stage_start.elapsed().as_secs_f64());

        // AwaitingRemoteReady
        run.enter(AwaitingRemoteReady).await;
        let stage_start = Instant::now();
        let progress_tx = run.events.clone();
        self.analysis
            .await_ready(&mut handle, |h, attempt| {
                if h.state == RemoteState::Pending {
                    let _ = progress_tx.try_send(PipelineEvent::log(format!(
                        "Still processing on the service (check {})",
                        attempt
                    )));
                }
            })
            .await
            .map_err(at(AwaitingRemoteReady))?;
        run.remote = Some(handle.clone());
        metrics::record_stage_duration(
            AwaitingRemoteReady.as_str(),
            stage_start.elapsed().as_secs_f64(),
        );

        // SelectingModel
        run.enter(SelectingModel).await;
        let model = self
            .analysis
            .select_model(&self.selector)
            .await
            .map_err(at(SelectingModel))?;
        run.emit(PipelineEvent::log(format!("Using model {}", model.name)))
            .await;

        // Analyzing
        run.enter(Analyzing).await;
        let stage_start = Instant::now();
        let prompt = build_highlight_prompt(
            run.request.effective_instructions(),
            run.request.target_duration,
        );
        let raw = self
            .analysis
            .generate(&handle, &prompt, &model.name)
            .await
            .map_err(at(Analyzing))?;
        metrics::record_stage_duration(Analyzing.as_str(), stage_start.elapsed().as_secs_f64());

        // Parsing
        run.enter(Parsing).await;
        let segments = parse_proposals(&raw, source_duration).map_err(at(Parsing))?;
        let report = format_decision_report(&segments);
        metrics::record_segments_accepted(segments.len());
        run.emit(PipelineEvent::log(format!("Selected segments:\n{}", report)))
            .await;

        // Assembling
        run.enter(Assembling).await;
        let stage_start = Instant::now();
        let tracker = Arc::new(RenderProgressTracker::new(run.events.clone()));
        tracker.start();
        let sink: Arc<dyn EncoderProgressSink> = tracker.clone();
        let assembled = self
            .renderer
            .assemble(
                run.workspace.input_path(),
                &segments,
                run.workspace.render_path(),
                sink,
            )
            .await
            .map_err(at(Assembling))?;
        tracker.finish().await;

        let output_path = self.config.output_dir.join(run.request.output_file_name());
        move_file(&assembled.path, &output_path)
            .await
            .map_err(at(Assembling))?;
        metrics::record_stage_duration(Assembling.as_str(), stage_start.elapsed().as_secs_f64());

        Ok(RunOutcome {
            run_id: run.id.clone(),
            output_path,
            duration: assembled.duration,
            segments,
            model: model.name,
            report,
        })
    }

    /// Release everything the run holds.
    ///
    /// Deletes the uploaded file (best effort) and removes the temporary
    /// files, retrying a locked file once. Never fails; calling it again on
    /// a cleaned run changes nothing.
    pub async fn cleanup(&self, run: &mut PipelineRun) {
        if run.state != PipelineState::Cleanup {
            run.enter(PipelineState::Cleanup).await;
        }

        if let Some(handle) = run.remote.take() {
            match self.analysis.delete(&handle).await {
                Ok(()) => debug!(id = %handle.id, "Deleted remote file"),
                Err(e) => {
                    run.logger
                        .cleanup_incomplete(&format!("remote file {} not deleted: {}", handle.id, e));
                    metrics::record_cleanup_failure("remote");
                }
            }
        }

        if !run.workspace.cleanup().await {
            run.logger.cleanup_incomplete("temporary files left in the work directory");
            metrics::record_cleanup_failure("local");
        }
    }
}
