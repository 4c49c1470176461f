//! Check stage definitions and measurement.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use tsmon_core::{
    capture_output, emit_counts_measured, extractor_for, split_command_line, BranchState,
    CheckKind, CommandRunner, ErrorCountSnapshot, Invocation, Result,
};

/// Default type-checker command.
pub const DEFAULT_TS_SCRIPT: &str = "npx tsc --noEmit";

/// Default linter command.
pub const DEFAULT_LINT_SCRIPT: &str = "npx eslint .";

/// Configuration for one check stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckStage {
    pub kind: CheckKind,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Whether this stage is enabled.
    pub enabled: bool,
}

impl CheckStage {
    /// Create a stage from a script line such as `npx tsc --noEmit`.
    pub fn from_script(kind: CheckKind, script: &str) -> Self {
        Self {
            kind,
            command: split_command_line(script),
            enabled: true,
        }
    }

    /// The stage with its default command.
    pub fn builtin(kind: CheckKind) -> Self {
        match kind {
            CheckKind::TypeChecker => Self::from_script(kind, DEFAULT_TS_SCRIPT),
            CheckKind::Linter => Self::from_script(kind, DEFAULT_LINT_SCRIPT),
        }
    }

    /// Disable this stage.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Run the tool silently and count its errors.
    pub async fn measure(
        &self,
        runner: &dyn CommandRunner,
        work_dir: &Path,
        branch: BranchState,
    ) -> Result<u64> {
        let invocation = Invocation::from_argv(&self.command, work_dir)?;
        info!(kind = %self.kind, branch = %branch, command = %invocation.display(), "measuring errors");

        let raw = capture_output(runner, &invocation).await;
        let count = extractor_for(self.kind).extract(&raw, branch)?;
        emit_counts_measured(self.kind, branch, count);
        Ok(count)
    }
}

/// Measure every enabled stage, in order. Disabled kinds stay at zero.
pub async fn measure_all(
    stages: &[CheckStage],
    runner: &dyn CommandRunner,
    work_dir: &Path,
    branch: BranchState,
) -> Result<ErrorCountSnapshot> {
    let mut snapshot = ErrorCountSnapshot::default();
    for stage in stages.iter().filter(|s| s.enabled) {
        let count = stage.measure(runner, work_dir, branch).await?;
        snapshot.set(stage.kind, count);
    }
    Ok(snapshot)
}
