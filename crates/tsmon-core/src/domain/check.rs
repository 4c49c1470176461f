//! Check kinds, branch states and per-branch error count snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The static-analysis categories tsmon measures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// `tsc` style type checker.
    TypeChecker,

    /// ESLint style linter.
    Linter,
}

impl CheckKind {
    /// All check kinds, in report order.
    pub const ALL: [CheckKind; 2] = [CheckKind::TypeChecker, CheckKind::Linter];

    /// Stable machine key.
    pub fn key(&self) -> &'static str {
        match self {
            CheckKind::TypeChecker => "typescript",
            CheckKind::Linter => "eslint",
        }
    }

    /// Name shown in summaries and failure messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            CheckKind::TypeChecker => "TypeScript",
            CheckKind::Linter => "ESLint",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which side of the comparison a measurement belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BranchState {
    Current,
    Base,
}

impl BranchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchState::Current => "current",
            BranchState::Base => "base",
        }
    }
}

impl fmt::Display for BranchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which check kinds are enabled for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EnabledChecks {
    pub type_checker: bool,
    pub linter: bool,
}

impl EnabledChecks {
    pub fn new(type_checker: bool, linter: bool) -> Self {
        Self {
            type_checker,
            linter,
        }
    }

    pub fn is_enabled(&self, kind: CheckKind) -> bool {
        match kind {
            CheckKind::TypeChecker => self.type_checker,
            CheckKind::Linter => self.linter,
        }
    }

    /// Enabled kinds in report order.
    pub fn kinds(&self) -> impl Iterator<Item = CheckKind> + '_ {
        CheckKind::ALL.into_iter().filter(|k| self.is_enabled(*k))
    }
}

/// Error counts for every check kind in one branch state.
///
/// Disabled kinds stay at zero so that deltas are always well defined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorCountSnapshot {
    pub typescript: u64,
    pub eslint: u64,
}

impl ErrorCountSnapshot {
    pub fn get(&self, kind: CheckKind) -> u64 {
        match kind {
            CheckKind::TypeChecker => self.typescript,
            CheckKind::Linter => self.eslint,
        }
    }

    pub fn set(&mut self, kind: CheckKind, count: u64) {
        match kind {
            CheckKind::TypeChecker => self.typescript = count,
            CheckKind::Linter => self.eslint = count,
        }
    }

    pub fn with(mut self, kind: CheckKind, count: u64) -> Self {
        self.set(kind, count);
        self
    }
}
