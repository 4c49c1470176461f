//! Error count extraction from captured tool output.
//!
//! Each check kind has its own [`Extractor`]. Extractors are pure: the same
//! text always yields the same count. Output is normalized first (ANSI
//! escapes stripped, line endings unified, trailing whitespace trimmed).

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::check::{BranchState, CheckKind};
use crate::domain::error::{MonitorError, Result};

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // CSI sequences, then OSC sequences terminated by BEL or ST.
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
            .expect("valid ansi regex")
    })
}

fn ts_error_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"error TS\d+:").expect("valid tsc regex"))
}

fn eslint_summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+ problems? \((?P<errors>\d+) errors?").expect("valid eslint regex")
    })
}

fn formatter_summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^Errors: (?P<errors>\d+)$").expect("valid formatter regex"))
}

/// Strip terminal escapes, unify line endings and trim trailing whitespace.
pub fn normalize_output(raw: &str) -> String {
    let stripped = ansi_re().replace_all(raw, "");
    stripped
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns captured tool output into an error count.
pub trait Extractor: Send + Sync {
    fn kind(&self) -> CheckKind;

    /// Count errors in already-normalized output.
    fn count_normalized(&self, text: &str) -> u64;

    /// Count errors in raw output. Empty output means the tool never ran.
    fn extract(&self, raw: &str, branch: BranchState) -> Result<u64> {
        if raw.trim().is_empty() {
            return Err(MonitorError::Extraction {
                kind: self.kind(),
                branch,
            });
        }
        Ok(self.count_normalized(&normalize_output(raw)))
    }
}

/// Counts `error TS<digits>:` diagnostic lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptExtractor;

impl Extractor for TypeScriptExtractor {
    fn kind(&self) -> CheckKind {
        CheckKind::TypeChecker
    }

    fn count_normalized(&self, text: &str) -> u64 {
        text.lines().filter(|line| ts_error_re().is_match(line)).count() as u64
    }
}

/// Reads the error total from ESLint's summary line.
///
/// Falls back to an `Errors: N` line (minimal formatter output). Output
/// with neither line is treated as zero errors: ESLint's stylish formatter
/// prints nothing at all for a clean run.
#[derive(Debug, Default, Clone, Copy)]
pub struct EslintExtractor;

impl Extractor for EslintExtractor {
    fn kind(&self) -> CheckKind {
        CheckKind::Linter
    }

    fn count_normalized(&self, text: &str) -> u64 {
        eslint_summary_re()
            .captures(text)
            .or_else(|| formatter_summary_re().captures(text))
            .and_then(|caps| caps.name("errors"))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }
}

/// The extractor responsible for `kind`.
pub fn extractor_for(kind: CheckKind) -> &'static dyn Extractor {
    static TS: TypeScriptExtractor = TypeScriptExtractor;
    static ESLINT: EslintExtractor = EslintExtractor;
    match kind {
        CheckKind::TypeChecker => &TS,
        CheckKind::Linter => &ESLINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typescript_counts_error_lines() {
        let out = "file.ts:1:1 error TS2345: foo\nfile.ts:2:1 error TS2345: bar\n";
        let count = TypeScriptExtractor.extract(out, BranchState::Current).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_typescript_ignores_summary_lines() {
        let out = "src/a.ts(3,5): error TS2322: Type 'x'\n\nFound 1 error in src/a.ts:3\n";
        assert_eq!(TypeScriptExtractor.extract(out, BranchState::Base).unwrap(), 1);
    }

    #[test]
    fn test_typescript_zero_findings_with_output() {
        let out = "Done in 3.2s.\n";
        assert_eq!(TypeScriptExtractor.extract(out, BranchState::Current).unwrap(), 0);
    }

    #[test]
    fn test_typescript_strips_ansi() {
        let out = "\x1b[96msrc/a.ts\x1b[0m:\x1b[93m1\x1b[0m - \x1b[91merror\x1b[0m\x1b[90m TS2304: \x1b[0mCannot find name\r\n";
        assert_eq!(TypeScriptExtractor.extract(out, BranchState::Current).unwrap(), 1);
    }

    #[test]
    fn test_empty_output_is_extraction_error() {
        let err = TypeScriptExtractor.extract("", BranchState::Current).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Extraction {
                kind: CheckKind::TypeChecker,
                branch: BranchState::Current
            }
        ));
        let err = EslintExtractor.extract("  \n", BranchState::Base).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::Extraction {
                kind: CheckKind::Linter,
                ..
            }
        ));
    }

    #[test]
    fn test_eslint_summary_line() {
        let out = "...\n✖ 5 problems (5 errors, 0 warnings)\n";
        assert_eq!(EslintExtractor.extract(out, BranchState::Current).unwrap(), 5);
    }

    #[test]
    fn test_eslint_counts_errors_not_problems() {
        let out = "✖ 12 problems (4 errors, 8 warnings)\n  3 errors and 0 warnings potentially fixable\n";
        assert_eq!(EslintExtractor.extract(out, BranchState::Current).unwrap(), 4);
    }

    #[test]
    fn test_eslint_singular_summary() {
        let out = "✖ 1 problem (1 error, 0 warnings)\n";
        assert_eq!(EslintExtractor.extract(out, BranchState::Current).unwrap(), 1);
    }

    #[test]
    fn test_eslint_formatter_line() {
        let out = "yarn run v1.22\nErrors: 9   \nDone\n";
        assert_eq!(EslintExtractor.extract(out, BranchState::Base).unwrap(), 9);
    }

    #[test]
    fn test_eslint_no_summary_is_zero() {
        let out = "$ eslint src\nDone in 1.1s.\n";
        assert_eq!(EslintExtractor.extract(out, BranchState::Current).unwrap(), 0);
    }

    #[test]
    fn test_eslint_colored_summary() {
        let out = "\x1b[31m\x1b[1m✖ 3 problems (3 errors, 0 warnings)\x1b[22m\x1b[39m\n";
        assert_eq!(EslintExtractor.extract(out, BranchState::Current).unwrap(), 3);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let out = "a.ts(1,1): error TS1005: ';' expected.\n✖ 2 problems (2 errors, 0 warnings)\n";
        for kind in CheckKind::ALL {
            let extractor = extractor_for(kind);
            let first = extractor.extract(out, BranchState::Current).unwrap();
            let second = extractor.extract(out, BranchState::Current).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_extractor_for_kind() {
        assert_eq!(extractor_for(CheckKind::TypeChecker).kind(), CheckKind::TypeChecker);
        assert_eq!(extractor_for(CheckKind::Linter).kind(), CheckKind::Linter);
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("a  \r\nb\t\n"), "a\nb");
    }
}
