//! Domain-level error taxonomy for tsmon.
//!
//! Only fatal conditions live here. Recoverable outcomes (an empty base,
//! a failed fetch stage, a failed report call) are modelled as values and
//! logged, never raised.

use std::path::PathBuf;

use crate::domain::check::{BranchState, CheckKind};
use crate::hosting::HostingError;

/// Fatal tsmon errors. Any of these aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("could not check for {kind} errors: the {branch} run produced no output")]
    Extraction { kind: CheckKind, branch: BranchState },

    #[error("could not detect the project's package manager in {}", dir.display())]
    PackageManagerUndetected { dir: PathBuf },

    #[error(
        "unsupported event name: {event_name}. Only \"pull_request\", \"pull_request_target\" and \"push\" triggered workflows are supported"
    )]
    UnsupportedEvent { event_name: String },

    #[error("invalid {event_name} payload: {reason}")]
    InvalidPayload { event_name: String, reason: String },

    #[error("[{branch}] dependency install `{command}` exited with code {exit_code}")]
    InstallFailed {
        branch: BranchState,
        command: String,
        exit_code: i32,
    },

    #[error("could not check out base {target}: every reset strategy failed")]
    AcquisitionFailed { target: String },

    #[error("empty command for {0}")]
    EmptyCommand(String),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hosting api error: {0}")]
    Hosting(#[from] HostingError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tsmon domain operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
