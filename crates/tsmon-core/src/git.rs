//! Base acquisition: fetch the base commit and move the working tree onto it.
//!
//! Fetching is an ordered cascade of strategies, each tried only when the
//! previous one failed; a failed fetch is logged and never fatal. Resetting
//! the working tree is the hard requirement: a ref-based reset falls back to
//! a sha-based one, and if every reset fails the run cannot continue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::command::{CommandRunner, Invocation};
use crate::domain::error::{MonitorError, Result};
use crate::domain::event::BaseReference;
use crate::obs::emit_acquire_stage_failed;

const REMOTE: &str = "origin";

/// One way of getting the base commit into the local object store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "strategy", content = "target", rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Shallow fetch of a branch name.
    ByRef(String),
    /// Shallow fetch of a commit.
    BySha(String),
    /// Plain fetch with no explicit target.
    Unqualified,
}

impl FetchStrategy {
    pub fn git_args(&self) -> Vec<String> {
        let mut args = vec!["fetch".to_string(), "--no-tags".to_string()];
        match self {
            FetchStrategy::ByRef(r) => {
                args.extend(["--depth=1".to_string(), REMOTE.to_string(), branch_name(r).to_string()])
            }
            FetchStrategy::BySha(s) => {
                args.extend(["--depth=1".to_string(), REMOTE.to_string(), s.clone()])
            }
            FetchStrategy::Unqualified => {}
        }
        args
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::ByRef(r) => write!(f, "fetch ref {r}"),
            FetchStrategy::BySha(s) => write!(f, "fetch sha {s}"),
            FetchStrategy::Unqualified => f.write_str("fetch"),
        }
    }
}

/// Where the working tree can be reset to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "target", content = "value", rename_all = "snake_case")]
pub enum ResetTarget {
    /// The remote-tracking branch for a ref.
    RemoteRef(String),
    Sha(String),
}

impl ResetTarget {
    pub fn git_args(&self) -> Vec<String> {
        let target = match self {
            ResetTarget::RemoteRef(r) => format!("{REMOTE}/{}", branch_name(r)),
            ResetTarget::Sha(s) => s.clone(),
        };
        vec!["reset".to_string(), "--hard".to_string(), target]
    }
}

impl fmt::Display for ResetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetTarget::RemoteRef(r) => write!(f, "reset to {REMOTE}/{}", branch_name(r)),
            ResetTarget::Sha(s) => write!(f, "reset to {s}"),
        }
    }
}

/// A stage that failed and was skipped over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: String,
    pub reason: String,
}

/// The ordered fetch and reset steps for a base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcquisitionPlan {
    pub fetch: Vec<FetchStrategy>,
    pub reset: Vec<ResetTarget>,
}

impl AcquisitionPlan {
    pub fn for_base(base: &BaseReference) -> Self {
        let mut fetch = Vec::new();
        let mut reset = Vec::new();
        if let Some(r) = &base.git_ref {
            fetch.push(FetchStrategy::ByRef(r.clone()));
            reset.push(ResetTarget::RemoteRef(r.clone()));
        }
        if let Some(s) = &base.sha {
            fetch.push(FetchStrategy::BySha(s.clone()));
            reset.push(ResetTarget::Sha(s.clone()));
        }
        fetch.push(FetchStrategy::Unqualified);
        Self { fetch, reset }
    }
}

/// What the cascade ended up doing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcquisitionReport {
    /// The fetch that succeeded, if any did.
    pub fetched_by: Option<FetchStrategy>,
    pub reset_to: ResetTarget,
    /// Every recoverable failure along the way, in order.
    pub failures: Vec<StageFailure>,
}

/// Fetch `base` and reset the working tree in `work_dir` onto it.
pub async fn acquire_base(
    runner: &dyn CommandRunner,
    work_dir: &Path,
    base: &BaseReference,
) -> Result<AcquisitionReport> {
    execute_plan(runner, work_dir, &AcquisitionPlan::for_base(base), &base.describe()).await
}

/// Run a plan. Fetch steps stop at the first success; reset steps likewise,
/// but exhausting them is fatal.
pub async fn execute_plan(
    runner: &dyn CommandRunner,
    work_dir: &Path,
    plan: &AcquisitionPlan,
    target: &str,
) -> Result<AcquisitionReport> {
    let mut failures = Vec::new();

    let mut fetched_by = None;
    for strategy in &plan.fetch {
        match run_git(runner, work_dir, strategy.git_args()).await {
            Ok(()) => {
                info!(stage = %strategy, "base fetch succeeded");
                fetched_by = Some(strategy.clone());
                break;
            }
            Err(reason) => {
                emit_acquire_stage_failed(&strategy.to_string(), &reason);
                failures.push(StageFailure {
                    stage: strategy.to_string(),
                    reason,
                });
            }
        }
    }

    for reset in &plan.reset {
        match run_git(runner, work_dir, reset.git_args()).await {
            Ok(()) => {
                info!(stage = %reset, "working tree reset to base");
                return Ok(AcquisitionReport {
                    fetched_by,
                    reset_to: reset.clone(),
                    failures,
                });
            }
            Err(reason) => {
                warn!(stage = %reset, reason = %reason, "reset failed");
                failures.push(StageFailure {
                    stage: reset.to_string(),
                    reason,
                });
            }
        }
    }

    Err(MonitorError::AcquisitionFailed {
        target: target.to_string(),
    })
}

async fn run_git(
    runner: &dyn CommandRunner,
    work_dir: &Path,
    args: Vec<String>,
) -> std::result::Result<(), String> {
    let invocation = Invocation::new("git", args, work_dir);
    match runner.run(&invocation).await {
        Ok(out) if out.success() => Ok(()),
        Ok(out) => Err(format!(
            "exit code {}: {}",
            out.exit_code,
            out.output.lines().last().unwrap_or_default().trim()
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn branch_name(git_ref: &str) -> &str {
    git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref)
}
