//! Run configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tsmon_core::{CheckKind, EnabledChecks, DEFAULT_IDENTITY};

use crate::stage::{CheckStage, DEFAULT_LINT_SCRIPT, DEFAULT_TS_SCRIPT};

/// Typed configuration consumed by [`crate::MonitorPipeline`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    pub check_typescript: bool,
    pub check_linting: bool,
    pub ts_script: String,
    pub lint_script: String,

    /// Working directory override, relative to the process directory.
    pub cwd: Option<PathBuf>,

    /// Login that authors our comments.
    pub comment_identity: String,

    /// Where to write the JSON comparison artifact, if anywhere.
    pub report_json: Option<PathBuf>,

    /// Step summary file to append the markdown report to.
    pub step_summary: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_typescript: true,
            check_linting: false,
            ts_script: DEFAULT_TS_SCRIPT.to_string(),
            lint_script: DEFAULT_LINT_SCRIPT.to_string(),
            cwd: None,
            comment_identity: DEFAULT_IDENTITY.to_string(),
            report_json: None,
            step_summary: None,
        }
    }
}

impl MonitorConfig {
    /// The effective working directory under `base_dir`.
    pub fn work_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.cwd {
            Some(cwd) if !cwd.as_os_str().is_empty() => base_dir.join(cwd),
            _ => base_dir.to_path_buf(),
        }
    }

    pub fn enabled(&self) -> EnabledChecks {
        EnabledChecks::new(self.check_typescript, self.check_linting)
    }

    /// One stage per check kind, disabled where the config says so.
    pub fn stages(&self) -> Vec<CheckStage> {
        CheckKind::ALL
            .iter()
            .map(|&kind| {
                let (script, on) = match kind {
                    CheckKind::TypeChecker => (&self.ts_script, self.check_typescript),
                    CheckKind::Linter => (&self.lint_script, self.check_linting),
                };
                let stage = CheckStage::from_script(kind, script);
                if on {
                    stage
                } else {
                    stage.disabled()
                }
            })
            .collect()
    }
}

/// Actions-style boolean input: only the literal `true` enables.
pub fn parse_input_bool(value: &str) -> bool {
    value == "true"
}
