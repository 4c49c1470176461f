//! Gate evaluation for pass/fail criteria.

use serde::{Deserialize, Serialize};

use tsmon_core::Comparison;

/// Gate evaluation verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// One entry per regressed check kind (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Regression gate.
pub struct RegressionGate;

impl RegressionGate {
    /// Fail when any enabled kind has more errors than its base.
    ///
    /// Disabled kinds never fail the gate, whatever their counts.
    pub fn evaluate(comparison: &Comparison) -> GateVerdict {
        let violations: Vec<String> = comparison
            .regressions()
            .iter()
            .map(|d| format!("More {} errors were introduced", d.kind))
            .collect();

        let passed = violations.is_empty();
        let message = if passed {
            "No new errors introduced".to_string()
        } else {
            violations.join("\n")
        };

        GateVerdict {
            passed,
            violations,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsmon_core::{CheckKind, EnabledChecks, ErrorCountSnapshot};

    fn snapshot(ts: u64, lint: u64) -> ErrorCountSnapshot {
        ErrorCountSnapshot::default()
            .with(CheckKind::TypeChecker, ts)
            .with(CheckKind::Linter, lint)
    }

    #[test]
    fn test_no_change_passes() {
        let cmp = Comparison::new(snapshot(3, 0), snapshot(3, 0), EnabledChecks::new(true, true));
        let verdict = RegressionGate::evaluate(&cmp);
        assert!(verdict.passed);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_improvement_passes() {
        let cmp = Comparison::new(snapshot(1, 0), snapshot(5, 2), EnabledChecks::new(true, true));
        assert!(RegressionGate::evaluate(&cmp).passed);
    }

    #[test]
    fn test_regression_fails() {
        let cmp = Comparison::new(snapshot(3, 0), snapshot(1, 0), EnabledChecks::new(true, false));
        let verdict = RegressionGate::evaluate(&cmp);
        assert!(!verdict.passed);
        assert_eq!(verdict.violations, vec!["More TypeScript errors were introduced"]);
        assert_eq!(verdict.message, "More TypeScript errors were introduced");
    }

    #[test]
    fn test_disabled_kind_never_fails() {
        let cmp = Comparison::new(snapshot(0, 50), snapshot(0, 0), EnabledChecks::new(true, false));
        assert!(RegressionGate::evaluate(&cmp).passed);
    }

    #[test]
    fn test_both_kinds_regressed() {
        let cmp = Comparison::new(snapshot(2, 2), snapshot(1, 1), EnabledChecks::new(true, true));
        let verdict = RegressionGate::evaluate(&cmp);
        assert_eq!(verdict.violations.len(), 2);
        assert!(verdict.violations[1].contains("ESLint"));
    }
}
