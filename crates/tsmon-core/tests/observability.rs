//! Observability tests for the tsmon run lifecycle.

use tsmon_core::{
    emit_acquire_stage_failed, emit_counts_measured, emit_report_failed, emit_run_finished,
    emit_run_started, BranchState, CheckKind, HostingError, RunSpan,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn run_started_logs_event_name_and_sha() {
    emit_run_started("run-123", "pull_request", "abc123");
    assert!(logs_contain("run.started"));
    assert!(logs_contain("abc123"));
}

#[traced_test]
#[test]
fn counts_measured_logs_kind_branch_and_count() {
    emit_counts_measured(CheckKind::TypeChecker, BranchState::Base, 17);
    assert!(logs_contain("counts.measured"));
    assert!(logs_contain("Found 17 TypeScript errors"));
}

#[traced_test]
#[test]
fn acquire_stage_failure_is_a_warning() {
    emit_acquire_stage_failed("fetch ref main", "exit code 128");
    assert!(logs_contain("WARN"));
    assert!(logs_contain("acquire.stage_failed"));
}

#[traced_test]
#[test]
fn report_failure_logs_operation_and_error() {
    let err = HostingError::Status {
        status: 403,
        message: "Resource not accessible by integration".to_string(),
    };
    emit_report_failed("comment.create", &err);
    assert!(logs_contain("comment.create"));
    assert!(logs_contain("Resource not accessible"));
}

#[traced_test]
#[test]
fn run_span_tags_nested_events() {
    let _span = RunSpan::enter("run-span-1", "push");
    emit_run_finished("run-span-1", 1200, true, false);
    assert!(logs_contain("run.finished"));
    assert!(logs_contain("tsmon.run"));
}
