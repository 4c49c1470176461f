//! Package manager detection and dependency install.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::command::{CommandRunner, Invocation};
use crate::domain::check::BranchState;
use crate::domain::error::{MonitorError, Result};

/// Package manager inferred from the lockfile present in the project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
    Yarn,
    Npm,
}

impl PackageManager {
    /// Detect from lockfiles in `dir`. Yarn wins when both are present.
    pub fn detect(dir: &Path) -> Result<Self> {
        if dir.join("yarn.lock").exists() {
            Ok(PackageManager::Yarn)
        } else if dir.join("package-lock.json").exists() {
            Ok(PackageManager::Npm)
        } else {
            Err(MonitorError::PackageManagerUndetected {
                dir: dir.to_path_buf(),
            })
        }
    }

    /// Install command honouring the lockfile exactly.
    pub fn install_command(&self) -> Vec<String> {
        match self {
            PackageManager::Yarn => vec!["yarn".to_string(), "--frozen-lockfile".to_string()],
            PackageManager::Npm => vec!["npm".to_string(), "ci".to_string()],
        }
    }

    /// Install dependencies for the given branch state. A failed install is fatal.
    pub async fn install(
        &self,
        runner: &dyn CommandRunner,
        work_dir: &Path,
        branch: BranchState,
    ) -> Result<()> {
        let invocation = Invocation::from_argv(&self.install_command(), work_dir)?;
        info!(branch = %branch, command = %invocation.display(), "installing dependencies");

        let out = runner.run(&invocation).await?;
        if !out.success() {
            return Err(MonitorError::InstallFailed {
                branch,
                command: invocation.display(),
                exit_code: out.exit_code,
            });
        }
        Ok(())
    }
}
