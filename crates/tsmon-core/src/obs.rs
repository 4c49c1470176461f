//! Structured observability hooks for the tsmon run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via the `RunSpan` RAII guard
//! - Emission functions for key lifecycle events: start, measurement,
//!   acquisition stage failure, report failure and finish
//!
//! Every event carries an `event` field so JSON logs can be filtered on it.

use tracing::{info, warn};

use crate::domain::check::{BranchState, CheckKind};

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// ```ignore
/// let _span = RunSpan::enter("3f1c...", "pull_request");
/// // every log line below carries run_id and event_name
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str, event_name: &str) -> Self {
        let span = tracing::info_span!("tsmon.run", run_id = %run_id, event_name = %event_name);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_run_started(run_id: &str, event_name: &str, head_sha: &str) {
    info!(event = "run.started", run_id = %run_id, event_name = %event_name, head_sha = %head_sha);
}

/// Emit event: error count extracted for one kind and branch.
pub fn emit_counts_measured(kind: CheckKind, branch: BranchState, count: u64) {
    info!(
        event = "counts.measured",
        kind = kind.key(),
        branch = branch.as_str(),
        count = count,
        "Found {} {} errors",
        count,
        kind
    );
}

/// Emit event: a recoverable acquisition stage failed (warning level).
pub fn emit_acquire_stage_failed(stage: &str, reason: &str) {
    warn!(event = "acquire.stage_failed", stage = %stage, reason = %reason);
}

/// Emit event: a reporting call failed (warning level). Never fatal.
pub fn emit_report_failed(operation: &str, error: &dyn std::fmt::Display) {
    warn!(event = "report.failed", operation = %operation, error = %error);
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, compared: bool, regressed: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        compared = compared,
        regressed = regressed,
    );
}
