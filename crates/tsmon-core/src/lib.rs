//! tsmon Core Library
//!
//! Domain logic for comparing type-checker and linter error counts between
//! a change and its base: extraction, comparison, base resolution and
//! acquisition, and idempotent reporting to the hosting platform.

pub mod command;
pub mod compare;
pub mod domain;
pub mod extract;
pub mod fakes;
pub mod git;
pub mod hosting;
pub mod install;
pub mod obs;
pub mod publish;
pub mod reporting;
pub mod resolver;
pub mod telemetry;

pub use command::{capture_output, split_command_line, CommandOutput, CommandRunner, Invocation};
pub use compare::{Comparison, ErrorDelta, SeverityBand, SEVERE_DELTA_THRESHOLD};
pub use domain::{
    BaseReference, BranchState, CheckKind, EnabledChecks, ErrorCountSnapshot, MonitorError,
    PullRequestTrigger, ReportTarget, Result, TriggerEvent,
};
pub use extract::{extractor_for, normalize_output, EslintExtractor, Extractor, TypeScriptExtractor};
pub use git::{
    acquire_base, execute_plan, AcquisitionPlan, AcquisitionReport, FetchStrategy, ResetTarget,
    StageFailure,
};
pub use hosting::{
    CheckConclusion, CheckOutput, CheckRunState, Comment, HostingApi, HostingError,
    HostingResult, PullRequest,
};
pub use install::PackageManager;
pub use obs::{
    emit_acquire_stage_failed, emit_counts_measured, emit_report_failed, emit_run_finished,
    emit_run_started, RunSpan,
};
pub use publish::{
    comment_plan, ensure_marker, CheckRunHandle, CommentOutcome, CommentStep, ReportPublisher,
    CHECK_NAME, DEFAULT_IDENTITY, REPORT_MARKER,
};
pub use reporting::{
    append_step_summary, render_report_md, render_summary, write_comparison_json,
    ComparisonArtifact, DeltaArtifact,
};
pub use resolver::{resolve_base, select_open_pull_request, BaseResolution, ResolvedBase};
pub use telemetry::init_tracing;

/// tsmon version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
