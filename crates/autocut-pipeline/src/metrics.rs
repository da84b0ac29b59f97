//! Run metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_STARTED_TOTAL: &str = "autocut_runs_started_total";
    pub const RUNS_COMPLETED_TOTAL: &str = "autocut_runs_completed_total";
    pub const RUNS_FAILED_TOTAL: &str = "autocut_runs_failed_total";
    pub const STAGE_DURATION_SECONDS: &str = "autocut_stage_duration_seconds";
    pub const SEGMENTS_ACCEPTED_TOTAL: &str = "autocut_segments_accepted_total";
    pub const CLEANUP_FAILURES_TOTAL: &str = "autocut_cleanup_failures_total";
}

pub fn record_run_started() {
    counter!(names::RUNS_STARTED_TOTAL).increment(1);
}

pub fn record_run_completed(duration_secs: f64) {
    counter!(names::RUNS_COMPLETED_TOTAL).increment(1);
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => "total").record(duration_secs);
}

/// Record a failed run, labelled with the failing stage.
pub fn record_run_failed(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::RUNS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_segments_accepted(count: usize) {
    counter!(names::SEGMENTS_ACCEPTED_TOTAL).increment(count as u64);
}

/// Record a cleanup step that was given up on.
pub fn record_cleanup_failure(kind: &'static str) {
    counter!(names::CLEANUP_FAILURES_TOTAL, "kind" => kind).increment(1);
}
