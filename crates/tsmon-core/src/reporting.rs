//! Report rendering: the markdown comment body, the check run summary and
//! the JSON artifact written for CI consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::compare::{Comparison, ErrorDelta};
use crate::domain::error::Result;
use crate::domain::event::BaseReference;
use crate::publish::{CHECK_NAME, REPORT_MARKER};

const FOOTER: &str = "<sub>Reported by tsmon</sub>";

/// Machine-readable record of one comparison, written for CI consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub event_name: String,
    pub head_sha: String,
    pub base: BaseReference,
    pub deltas: Vec<DeltaArtifact>,
    pub regressed: bool,
}

/// One check kind in [`ComparisonArtifact`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeltaArtifact {
    pub kind: String,
    pub base: u64,
    pub current: u64,
    pub delta: i64,
    pub band: String,
}

impl From<&ErrorDelta> for DeltaArtifact {
    fn from(d: &ErrorDelta) -> Self {
        Self {
            kind: d.kind.key().to_string(),
            base: d.base,
            current: d.current,
            delta: d.delta(),
            band: d.band().as_str().to_string(),
        }
    }
}

impl ComparisonArtifact {
    pub fn new(comparison: &Comparison, event_name: &str, head_sha: &str, base: &BaseReference) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            generated_at: Utc::now(),
            event_name: event_name.to_string(),
            head_sha: head_sha.to_string(),
            base: base.clone(),
            deltas: comparison.deltas().iter().map(DeltaArtifact::from).collect(),
            regressed: comparison.regressed(),
        }
    }
}

/// Summary lines only, as shown on the check run. Each line is its own
/// markdown paragraph.
pub fn render_summary(comparison: &Comparison) -> String {
    let lines = comparison.summary_lines();
    if lines.is_empty() {
        "No checks enabled".to_string()
    } else {
        lines.join("\n\n")
    }
}

/// Full markdown report for the pull request comment and step summary.
pub fn render_report_md(comparison: &Comparison, base: &BaseReference) -> String {
    let mut out = format!("## {CHECK_NAME}\n\n");
    out.push_str(&render_summary(comparison));
    out.push_str("\n\n");

    let deltas = comparison.deltas();
    if !deltas.is_empty() {
        out.push_str(&format!("| Check | Base (`{}`) | Current | Δ |\n", base.describe()));
        out.push_str("|---|---:|---:|---:|\n");
        for d in &deltas {
            out.push_str(&format!(
                "| {} | {} | {} | {:+} |\n",
                d.kind, d.base, d.current, d.delta()
            ));
        }
        out.push('\n');
    }

    out.push_str(FOOTER);
    out.push_str("\n\n");
    out.push_str(REPORT_MARKER);
    out
}

/// Write the comparison artifact as pretty JSON.
pub fn write_comparison_json(path: &Path, artifact: &ComparisonArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Append markdown to a step summary file, creating it if needed.
pub fn append_step_summary(path: &Path, markdown: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{markdown}")?;
    Ok(())
}
