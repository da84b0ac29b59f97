//! Render progress normalization.
//!
//! The assembler reports encoder progress as `(bar, attribute, current, total)`
//! ticks. [`RenderProgressTracker`] keeps only the timeline bar, turns it into
//! a fraction in `[0, 1]` and publishes it on a bounded channel.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;

use autocut_models::PipelineEvent;

/// Bar name for the overall timeline-rendering pass.
pub const TIMELINE_BAR: &str = "t";

/// Bar name for per-frame counters.
pub const FRAME_BAR: &str = "frame_index";

/// Phase label attached to render progress.
pub const RENDER_PHASE: &str = "rendering";

/// Receiver of encoder progress ticks.
///
/// Called inline with encoding, so implementations must return promptly.
pub trait EncoderProgressSink: Send + Sync {
    fn on_bar_update(&self, bar: &str, attribute: &str, current: f64, total: f64);
}

/// Publishes monotonic render progress for one render operation.
pub struct RenderProgressTracker {
    tx: mpsc::Sender<PipelineEvent>,
    phase: String,
    /// Last fraction the channel accepted, `None` before the first one
    last: Mutex<Option<f64>>,
}

impl RenderProgressTracker {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self::with_phase(tx, RENDER_PHASE)
    }

    pub fn with_phase(tx: mpsc::Sender<PipelineEvent>, phase: impl Into<String>) -> Self {
        Self {
            tx,
            phase: phase.into(),
            last: Mutex::new(None),
        }
    }

    /// Publish the initial 0.0 update.
    pub fn start(&self) {
        self.publish(0.0);
    }

    /// Publish the final 1.0 update, waiting for room on the channel.
    ///
    /// Does nothing when 1.0 was already delivered by a tick.
    pub async fn finish(&self) {
        if self.fraction() >= 1.0 {
            return;
        }
        match self
            .tx
            .send(PipelineEvent::progress(1.0, self.phase.clone()))
            .await
        {
            Ok(()) => *self.last_sent() = Some(1.0),
            Err(_) => debug!("Progress subscriber gone before the render finished"),
        }
    }

    /// Last fraction delivered to the channel.
    pub fn fraction(&self) -> f64 {
        self.last_sent().unwrap_or(0.0)
    }

    fn last_sent(&self) -> std::sync::MutexGuard<'_, Option<f64>> {
        self.last.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish `fraction` unless it would move progress backwards.
    ///
    /// Ticks never wait on the subscriber; a tick the channel rejects is
    /// not recorded, so a later tick with the same value still goes out.
    fn publish(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut last = self.last_sent();
        if last.is_some_and(|prev| fraction <= prev) {
            return;
        }
        match self
            .tx
            .try_send(PipelineEvent::progress(fraction, self.phase.clone()))
        {
            Ok(()) => *last = Some(fraction),
            Err(e) => debug!("Dropping render progress update {:.3}: {}", fraction, e),
        }
    }
}

impl EncoderProgressSink for RenderProgressTracker {
    fn on_bar_update(&self, bar: &str, _attribute: &str, current: f64, total: f64) {
        if bar != TIMELINE_BAR || total <= 0.0 {
            return;
        }
        self.publish((current / total).min(1.0));
    }
}
