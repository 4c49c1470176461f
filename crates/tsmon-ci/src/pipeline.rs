//! Run orchestration: measure, resolve, acquire, compare, publish.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tsmon_core::{
    acquire_base, append_step_summary, emit_run_finished, emit_run_started, render_report_md,
    render_summary, resolve_base, write_comparison_json, AcquisitionReport, BaseReference,
    BaseResolution, BranchState, CheckConclusion, CheckRunHandle, CommandRunner, CommentOutcome,
    Comparison, ComparisonArtifact, ErrorCountSnapshot, HostingApi, MonitorError,
    PackageManager, ReportPublisher, ReportTarget, ResolvedBase, Result, RunSpan, TriggerEvent,
};

use crate::config::MonitorConfig;
use crate::gate::{GateVerdict, RegressionGate};
use crate::stage::{measure_all, CheckStage};

/// Everything a run needs from the outside world.
pub struct PipelineContext<'a> {
    pub runner: &'a dyn CommandRunner,
    /// `None` disables reporting and push resolution.
    pub api: Option<&'a dyn HostingApi>,
    pub config: &'a MonitorConfig,
    pub event: &'a TriggerEvent,
    /// Directory the process was started in; `config.cwd` is applied on top.
    pub base_dir: PathBuf,
}

/// Orchestrator states, in the order a full run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    MeasuringCurrent,
    ResolvingBase,
    AcquiringBase,
    MeasuringBase,
    Comparing,
    Publishing,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::MeasuringCurrent => "measuring-current",
            PipelineState::ResolvingBase => "resolving-base",
            PipelineState::AcquiringBase => "acquiring-base",
            PipelineState::MeasuringBase => "measuring-base",
            PipelineState::Comparing => "comparing",
            PipelineState::Publishing => "publishing",
            PipelineState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Result of a run that reached the comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub run_id: String,
    pub comparison: Comparison,
    pub base: BaseReference,
    pub target: ReportTarget,
    pub verdict: GateVerdict,
    pub acquisition: AcquisitionReport,
    /// `None` when reporting is disabled.
    pub comment: Option<CommentOutcome>,
    pub report_markdown: String,
    pub duration_ms: u64,
}

/// How a run ended, short of a fatal error.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Nothing to compare against. Counts as a pass.
    NoBase { run_id: String },
    Compared(Box<ComparisonResult>),
}

impl RunOutcome {
    /// False only when a regression was detected.
    pub fn passed(&self) -> bool {
        match self {
            RunOutcome::NoBase { .. } => true,
            RunOutcome::Compared(result) => result.verdict.passed,
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            RunOutcome::NoBase { run_id } => run_id,
            RunOutcome::Compared(result) => &result.run_id,
        }
    }
}

/// Run orchestrator.
pub struct MonitorPipeline;

impl MonitorPipeline {
    /// Execute one monitoring run.
    ///
    /// Fatal conditions are returned as errors. When one happens after the
    /// check run was opened, the check run is completed as a failure first.
    pub async fn run(ctx: &PipelineContext<'_>) -> Result<RunOutcome> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let _span = RunSpan::enter(&run_id, ctx.event.event_name());
        emit_run_started(&run_id, ctx.event.event_name(), ctx.event.head_sha());

        let work_dir = ctx.config.work_dir(&ctx.base_dir);
        let stages = ctx.config.stages();
        debug!(work_dir = %work_dir.display(), "effective working directory");

        let package_manager = PackageManager::detect(&work_dir)?;
        info!(package_manager = ?package_manager, "package manager detected");

        transition(PipelineState::MeasuringCurrent);
        package_manager
            .install(ctx.runner, &work_dir, BranchState::Current)
            .await?;
        let current = measure_all(&stages, ctx.runner, &work_dir, BranchState::Current).await?;

        transition(PipelineState::ResolvingBase);
        let resolved = match resolve_base(ctx.event, ctx.api).await? {
            BaseResolution::Found(resolved) => resolved,
            BaseResolution::Empty => {
                info!("no base to compare against, nothing to do");
                transition(PipelineState::Done);
                emit_run_finished(&run_id, elapsed_ms(start), false, false);
                return Ok(RunOutcome::NoBase { run_id });
            }
        };
        info!(base = %resolved.base.describe(), pull_number = resolved.target.pull_number, "base resolved");

        let publisher = match ctx.api {
            Some(api) => Some(ReportPublisher::new(api, ctx.config.comment_identity.clone())),
            None => {
                info!("no hosting api client, reporting disabled");
                None
            }
        };
        let check = match &publisher {
            Some(p) => p.open_check(&resolved.target).await,
            None => None,
        };

        let measured = measure_base(ctx, &resolved, package_manager, &work_dir, &stages).await;
        let (acquisition, base_counts) = match measured {
            Ok(v) => v,
            Err(e) => {
                fail_check(publisher.as_ref(), check, &e).await;
                emit_run_finished(&run_id, elapsed_ms(start), false, false);
                return Err(e);
            }
        };

        transition(PipelineState::Comparing);
        let comparison = Comparison::new(current, base_counts, ctx.config.enabled());
        let verdict = RegressionGate::evaluate(&comparison);
        for line in comparison.summary_lines() {
            info!("{line}");
        }
        let report_markdown = render_report_md(&comparison, &resolved.base);

        transition(PipelineState::Publishing);
        let mut comment = None;
        if let Some(publisher) = &publisher {
            if let Some(handle) = check {
                let conclusion = CheckConclusion::from_failed(!verdict.passed);
                publisher
                    .complete_check(handle, conclusion, &render_summary(&comparison))
                    .await;
            }
            comment = Some(
                publisher
                    .publish_comment(&resolved.target, &report_markdown)
                    .await,
            );
        }
        write_artifacts(ctx, &comparison, &resolved.base, &report_markdown);

        transition(PipelineState::Done);
        let duration_ms = elapsed_ms(start);
        emit_run_finished(&run_id, duration_ms, true, !verdict.passed);

        Ok(RunOutcome::Compared(Box::new(ComparisonResult {
            run_id,
            comparison,
            base: resolved.base,
            target: resolved.target,
            verdict,
            acquisition,
            comment,
            report_markdown,
            duration_ms,
        })))
    }
}

async fn measure_base(
    ctx: &PipelineContext<'_>,
    resolved: &ResolvedBase,
    package_manager: PackageManager,
    work_dir: &Path,
    stages: &[CheckStage],
) -> Result<(AcquisitionReport, ErrorCountSnapshot)> {
    transition(PipelineState::AcquiringBase);
    let acquisition = acquire_base(ctx.runner, work_dir, &resolved.base).await?;

    transition(PipelineState::MeasuringBase);
    package_manager
        .install(ctx.runner, work_dir, BranchState::Base)
        .await?;
    let counts = measure_all(stages, ctx.runner, work_dir, BranchState::Base).await?;
    Ok((acquisition, counts))
}

async fn fail_check(
    publisher: Option<&ReportPublisher<'_>>,
    check: Option<CheckRunHandle>,
    error: &MonitorError,
) {
    if let (Some(publisher), Some(handle)) = (publisher, check) {
        publisher
            .complete_check(handle, CheckConclusion::Failure, &error.to_string())
            .await;
    }
}

fn write_artifacts(
    ctx: &PipelineContext<'_>,
    comparison: &Comparison,
    base: &BaseReference,
    markdown: &str,
) {
    if let Some(path) = &ctx.config.report_json {
        let artifact = ComparisonArtifact::new(
            comparison,
            ctx.event.event_name(),
            ctx.event.head_sha(),
            base,
        );
        if let Err(e) = write_comparison_json(path, &artifact) {
            warn!(path = %path.display(), error = %e, "failed to write comparison json");
        }
    }
    if let Some(path) = &ctx.config.step_summary {
        if let Err(e) = append_step_summary(path, markdown) {
            warn!(path = %path.display(), error = %e, "failed to append step summary");
        }
    }
}

fn transition(state: PipelineState) {
    debug!(state = %state, "pipeline state");
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
