//! Domain models for tsmon.
//!
//! Canonical definitions for the core entities:
//! - `CheckKind` / `BranchState`: what is measured and on which side
//! - `ErrorCountSnapshot`: counts for one branch state
//! - `TriggerEvent` / `BaseReference`: what triggered the run and what to compare against

pub mod check;
pub mod error;
pub mod event;

pub use check::{BranchState, CheckKind, EnabledChecks, ErrorCountSnapshot};
pub use error::{MonitorError, Result};
pub use event::{BaseReference, PullRequestTrigger, ReportTarget, TriggerEvent};
