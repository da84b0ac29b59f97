//! Content-analysis client.
//!
//! Wraps an [`AnalysisService`] with the run-level operations: upload,
//! bounded readiness polling, model selection and generation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use autocut_models::{ModelDescriptor, RemoteMediaHandle, RemoteState};

use crate::error::{AnalysisError, AnalysisResult};
use crate::selector::ModelSelector;
use crate::service::AnalysisService;

/// Floor applied to [`PollConfig::interval`].
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Readiness polling settings.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between status checks, never below [`MIN_POLL_INTERVAL`]
    pub interval: Duration,
    /// Give up after this long
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// Run-level analysis operations over a service.
pub struct ContentAnalysisClient<S: AnalysisService + ?Sized> {
    service: Arc<S>,
    poll: PollConfig,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl<S: AnalysisService + ?Sized> ContentAnalysisClient<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            poll: PollConfig::default(),
            cancel_rx: None,
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Abort readiness polling when `cancel_rx` flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn ensure_credentials(&self) -> AnalysisResult<()> {
        self.service.ensure_credentials()
    }

    /// Upload the local source video.
    pub async fn upload(&self, path: &Path) -> AnalysisResult<RemoteMediaHandle> {
        let handle = self.service.upload(path).await?;
        info!(id = %handle.id, state = %handle.state, "Source uploaded");
        Ok(handle)
    }

    /// Poll until `handle` reaches a terminal state.
    ///
    /// Returns at once when the handle is already terminal. `on_poll` is
    /// called after every status check with the updated handle and the
    /// attempt number (starting at 1).
    pub async fn await_ready<F>(
        &self,
        handle: &mut RemoteMediaHandle,
        mut on_poll: F,
    ) -> AnalysisResult<()>
    where
        F: FnMut(&RemoteMediaHandle, u32) + Send,
    {
        let deadline = Instant::now() + self.poll.max_wait;
        let interval = self.poll.interval.max(MIN_POLL_INTERVAL);
        let mut cancel_rx = self.cancel_rx.clone();
        let mut attempt: u32 = 0;

        loop {
            match handle.state {
                RemoteState::Ready => return Ok(()),
                RemoteState::Failed => {
                    return Err(AnalysisError::RemoteProcessingFailed(handle.id.clone()))
                }
                RemoteState::Pending => {}
            }

            if cancel_rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false) {
                return Err(AnalysisError::Cancelled);
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(id = %handle.id, attempts = attempt, "Remote file never became ready");
                return Err(AnalysisError::ReadyTimeout(self.poll.max_wait));
            }
            let wait = interval.min(deadline - now);

            let mut sender_gone = false;
            match cancel_rx.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        changed = rx.changed() => {
                            if changed.is_err() {
                                sender_gone = true;
                            } else if *rx.borrow() {
                                return Err(AnalysisError::Cancelled);
                            }
                        }
                    }
                }
                None => tokio::time::sleep(wait).await,
            }
            if sender_gone {
                // No cancellation can arrive any more.
                cancel_rx = None;
                tokio::time::sleep(wait).await;
            }

            attempt += 1;
            let state = self.service.get_status(&handle.id).await?;
            handle
                .apply_state(state)
                .map_err(|e| AnalysisError::invalid_response(e.to_string()))?;
            debug!(id = %handle.id, state = %handle.state, attempt = attempt, "Polled remote file");
            on_poll(handle, attempt);
        }
    }

    pub async fn list_models(&self) -> AnalysisResult<Vec<ModelDescriptor>> {
        self.service.list_models().await
    }

    /// List the service's models and pick one with `selector`.
    pub async fn select_model(&self, selector: &ModelSelector) -> AnalysisResult<ModelDescriptor> {
        let candidates = self.list_models().await?;
        let chosen = selector.select(&candidates)?;
        info!(
            model = %chosen.name,
            candidates = candidates.len(),
            "Selected analysis model"
        );
        Ok(chosen)
    }

    /// Run the model over the uploaded file and return its raw text.
    ///
    /// Every failure, a rejected credential included, comes back as
    /// [`AnalysisError::ModelInvocation`] carrying the upstream message.
    pub async fn generate(
        &self,
        handle: &RemoteMediaHandle,
        prompt: &str,
        model: &str,
    ) -> AnalysisResult<String> {
        match self.service.generate(handle, prompt, model).await {
            Ok(text) => Ok(text),
            Err(e @ AnalysisError::ModelInvocation { .. }) => Err(e),
            Err(e) => Err(AnalysisError::model_invocation(model, e.to_string())),
        }
    }

    /// Delete the uploaded file.
    pub async fn delete(&self, handle: &RemoteMediaHandle) -> AnalysisResult<()> {
        self.service.delete(&handle.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Service that reports queued states, then repeats the last one.
    struct FakeService {
        states: Mutex<VecDeque<RemoteState>>,
        polls: Mutex<u32>,
        generate_error: Mutex<Option<AnalysisError>>,
    }

    impl FakeService {
        fn new(states: &[RemoteState]) -> Self {
            Self {
                states: Mutex::new(states.iter().copied().collect()),
                polls: Mutex::new(0),
                generate_error: Mutex::new(None),
            }
        }

        fn failing_generate(error: AnalysisError) -> Self {
            let service = Self::new(&[RemoteState::Ready]);
            *service.generate_error.lock().unwrap() = Some(error);
            service
        }

        fn polls(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AnalysisService for FakeService {
        async fn upload(&self, _path: &Path) -> AnalysisResult<RemoteMediaHandle> {
            Ok(pending())
        }

        async fn get_status(&self, _id: &str) -> AnalysisResult<RemoteState> {
            *self.polls.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            if states.len() > 1 {
                Ok(states.pop_front().unwrap())
            } else {
                Ok(states.front().copied().unwrap_or(RemoteState::Pending))
            }
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
            match self.generate_error.lock().unwrap().take() {
                Some(error) => Err(error),
                None => Ok("[]".to_string()),
            }
        }

        async fn delete(&self, _id: &str) -> AnalysisResult<()> {
            Ok(())
        }
    }

    fn pending() -> RemoteMediaHandle {
        RemoteMediaHandle::new("files/abc", "https://x/files/abc", "video/mp4", RemoteState::Pending)
    }

    fn fast_poll() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(5),
            max_wait: Duration::from_secs(5),
        }
    }

    fn client(service: FakeService) -> ContentAnalysisClient<FakeService> {
        ContentAnalysisClient::new(Arc::new(service)).with_poll_config(fast_poll())
    }

    #[tokio::test]
    async fn test_await_ready_polls_until_ready() {
        let client = client(FakeService::new(&[
            RemoteState::Pending,
            RemoteState::Pending,
            RemoteState::Ready,
        ]));
        let mut handle = pending();
        let mut seen = Vec::new();

        client
            .await_ready(&mut handle, |h, attempt| seen.push((h.state, attempt)))
            .await
            .unwrap();

        assert_eq!(handle.state, RemoteState::Ready);
        assert_eq!(
            seen,
            vec![
                (RemoteState::Pending, 1),
                (RemoteState::Pending, 2),
                (RemoteState::Ready, 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_await_ready_returns_immediately_when_terminal() {
        let client = client(FakeService::new(&[RemoteState::Pending]));
        let mut handle = pending();
        handle.apply_state(RemoteState::Ready).unwrap();

        client.await_ready(&mut handle, |_, _| {}).await.unwrap();
        assert_eq!(client.service.polls(), 0);
    }

    #[tokio::test]
    async fn test_await_ready_remote_failure() {
        let client = client(FakeService::new(&[RemoteState::Pending, RemoteState::Failed]));
        let mut handle = pending();

        let err = client.await_ready(&mut handle, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, AnalysisError::RemoteProcessingFailed(id) if id == "files/abc"));
    }

    #[tokio::test]
    async fn test_await_ready_times_out() {
        let client = ContentAnalysisClient::new(Arc::new(FakeService::new(&[RemoteState::Pending])))
            .with_poll_config(PollConfig {
                interval: Duration::from_millis(10),
                max_wait: Duration::from_millis(50),
            });
        let mut handle = pending();

        let err = client.await_ready(&mut handle, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ReadyTimeout(_)));
        assert!(client.service.polls() >= 1);
    }

    #[tokio::test]
    async fn test_await_ready_cancelled() {
        let (tx, rx) = watch::channel(false);
        let client = ContentAnalysisClient::new(Arc::new(FakeService::new(&[RemoteState::Pending])))
            .with_poll_config(PollConfig {
                interval: Duration::from_secs(30),
                max_wait: Duration::from_secs(60),
            })
            .with_cancel(rx);
        let mut handle = pending();

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });

        let err = client.await_ready(&mut handle, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
        cancel.await.unwrap();
    }

    #[tokio::test]
    async fn test_select_model_uses_priority() {
        let client = client(FakeService::new(&[RemoteState::Ready]));
        let chosen = client.select_model(&ModelSelector::default()).await.unwrap();
        assert_eq!(chosen.name, "models/gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_zero_interval_is_floored() {
        let client = ContentAnalysisClient::new(Arc::new(FakeService::new(&[
            RemoteState::Pending,
            RemoteState::Ready,
        ])))
        .with_poll_config(PollConfig {
            interval: Duration::ZERO,
            max_wait: Duration::from_secs(5),
        });
        let mut handle = pending();

        let started = std::time::Instant::now();
        assert_ok!(client.await_ready(&mut handle, |_, _| {}).await);

        assert_eq!(client.service.polls(), 2);
        assert!(started.elapsed() >= MIN_POLL_INTERVAL * 2);
    }

    #[tokio::test]
    async fn test_generate_wraps_upstream_error() {
        let client = client(FakeService::failing_generate(AnalysisError::RequestFailed {
            status: 500,
            message: "quota exhausted".to_string(),
        }));

        let err = assert_err!(
            client
                .generate(&pending(), "prompt", "models/gemini-2.5-flash")
                .await
        );
        match err {
            AnalysisError::ModelInvocation { model, message } => {
                assert_eq!(model, "models/gemini-2.5-flash");
                assert!(message.contains("quota exhausted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_wraps_rejected_credential() {
        let client = client(FakeService::failing_generate(AnalysisError::from_http_status(
            403,
            "API key expired",
        )));

        let err = assert_err!(client.generate(&pending(), "prompt", "models/gemini-pro").await);
        match err {
            AnalysisError::ModelInvocation { model, message } => {
                assert_eq!(model, "models/gemini-pro");
                assert!(message.contains("API key expired"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
