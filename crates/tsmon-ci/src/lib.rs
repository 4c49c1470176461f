//! tsmon CI - run orchestration
//!
//! Provides the pipeline that:
//! - Captures type-checker and linter output on the current and base commits
//! - Resolves and checks out the base through a fetch/reset cascade
//! - Gates on error-count regressions and publishes the report

pub mod config;
pub mod gate;
pub mod pipeline;
pub mod runner;
pub mod stage;

// Re-export key types
pub use config::{parse_input_bool, MonitorConfig};
pub use gate::{GateVerdict, RegressionGate};
pub use pipeline::{ComparisonResult, MonitorPipeline, PipelineContext, PipelineState, RunOutcome};
pub use runner::ShellRunner;
pub use stage::{measure_all, CheckStage, DEFAULT_LINT_SCRIPT, DEFAULT_TS_SCRIPT};
