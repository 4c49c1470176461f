//! Count comparison between the current branch and its base.

use serde::{Deserialize, Serialize};

use crate::domain::check::{CheckKind, EnabledChecks, ErrorCountSnapshot};

/// Deltas beyond this magnitude fall in the severe bands.
pub const SEVERE_DELTA_THRESHOLD: i64 = 10;

/// Magnitude banding of an error delta.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    SevereRegression,
    MinorRegression,
    Unchanged,
    MinorImprovement,
    SevereImprovement,
}

impl SeverityBand {
    pub fn from_delta(delta: i64) -> Self {
        match delta {
            0 => SeverityBand::Unchanged,
            d if d > SEVERE_DELTA_THRESHOLD => SeverityBand::SevereRegression,
            d if d > 0 => SeverityBand::MinorRegression,
            d if d < -SEVERE_DELTA_THRESHOLD => SeverityBand::SevereImprovement,
            _ => SeverityBand::MinorImprovement,
        }
    }

    /// Wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::SevereRegression => "severe_regression",
            SeverityBand::MinorRegression => "minor_regression",
            SeverityBand::Unchanged => "unchanged",
            SeverityBand::MinorImprovement => "minor_improvement",
            SeverityBand::SevereImprovement => "severe_improvement",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SeverityBand::SevereRegression => "🚨",
            SeverityBand::MinorRegression => "⚠️",
            SeverityBand::Unchanged => "✅",
            SeverityBand::MinorImprovement => "👍",
            SeverityBand::SevereImprovement => "🎉",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityBand::SevereRegression => "large increase",
            SeverityBand::MinorRegression => "small increase",
            SeverityBand::Unchanged => "no change",
            SeverityBand::MinorImprovement => "small decrease",
            SeverityBand::SevereImprovement => "large decrease",
        }
    }
}

/// Change in error count for one check kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDelta {
    pub kind: CheckKind,
    pub current: u64,
    pub base: u64,
}

impl ErrorDelta {
    pub fn new(kind: CheckKind, current: u64, base: u64) -> Self {
        Self {
            kind,
            current,
            base,
        }
    }

    /// `current - base`.
    pub fn delta(&self) -> i64 {
        self.current as i64 - self.base as i64
    }

    /// Only the sign matters for pass/fail.
    pub fn is_regression(&self) -> bool {
        self.delta() > 0
    }

    pub fn band(&self) -> SeverityBand {
        SeverityBand::from_delta(self.delta())
    }

    /// One human-readable summary line.
    pub fn summary_line(&self) -> String {
        let band = self.band();
        let magnitude = self.delta().unsigned_abs();
        let change = match band {
            SeverityBand::Unchanged => format!("{} error count unchanged", self.kind),
            SeverityBand::SevereRegression | SeverityBand::MinorRegression => {
                format!("{} errors increased by {}", self.kind, magnitude)
            }
            SeverityBand::MinorImprovement | SeverityBand::SevereImprovement => {
                format!("{} errors decreased by {}", self.kind, magnitude)
            }
        };
        format!(
            "{} {} ({}: {} → {})",
            band.icon(),
            change,
            band.label(),
            self.base,
            self.current
        )
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comparison {
    pub current: ErrorCountSnapshot,
    pub base: ErrorCountSnapshot,
    pub enabled: EnabledChecks,
}

impl Comparison {
    pub fn new(
        current: ErrorCountSnapshot,
        base: ErrorCountSnapshot,
        enabled: EnabledChecks,
    ) -> Self {
        Self {
            current,
            base,
            enabled,
        }
    }

    /// Delta for any kind. Disabled kinds always report zero.
    pub fn delta_for(&self, kind: CheckKind) -> ErrorDelta {
        if self.enabled.is_enabled(kind) {
            ErrorDelta::new(kind, self.current.get(kind), self.base.get(kind))
        } else {
            ErrorDelta::new(kind, 0, 0)
        }
    }

    /// Deltas for the enabled kinds, in report order.
    pub fn deltas(&self) -> Vec<ErrorDelta> {
        self.enabled.kinds().map(|k| self.delta_for(k)).collect()
    }

    pub fn regressions(&self) -> Vec<ErrorDelta> {
        self.deltas()
            .into_iter()
            .filter(ErrorDelta::is_regression)
            .collect()
    }

    /// True when any enabled kind regressed.
    pub fn regressed(&self) -> bool {
        self.deltas().iter().any(ErrorDelta::is_regression)
    }

    pub fn summary_lines(&self) -> Vec<String> {
        self.deltas().iter().map(ErrorDelta::summary_line).collect()
    }
}
