//! Command execution seam.
//!
//! Defines the `CommandRunner` async trait used for every external process
//! tsmon starts (git, the package manager, the checked tools), plus the
//! silent output capture built on top of it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::domain::error::{MonitorError, Result};

// ---------------------------------------------------------------------------
// Invocation / output types
// ---------------------------------------------------------------------------

/// A single process invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// Build an invocation from an argv vector (first element is the program).
    pub fn from_argv(argv: &[String], cwd: &Path) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| MonitorError::EmptyCommand(cwd.display().to_string()))?;
        Ok(Self::new(program.clone(), args.iter().cloned(), cwd))
    }

    /// `program arg1 arg2 ...` for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Stdout and stderr merged in arrival order.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

// ---------------------------------------------------------------------------
// Runner trait
// ---------------------------------------------------------------------------

/// Trait for process execution backends.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion. Returns `Err` only when the process
    /// could not be started; a non-zero exit is an ordinary `Ok`.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Run a tool and return everything it printed, whatever its exit code.
///
/// Tools signal findings with a non-zero exit, so the status is ignored. A
/// process that cannot be started yields an empty buffer; callers decide
/// whether empty output is an error.
pub async fn capture_output(runner: &dyn CommandRunner, invocation: &Invocation) -> String {
    match runner.run(invocation).await {
        Ok(out) => out.output,
        Err(e) => {
            warn!(command = %invocation.display(), error = %e, "command could not be started");
            String::new()
        }
    }
}

/// Split a configured script into argv.
///
/// Whitespace separates words; single quotes keep their content verbatim;
/// double quotes group words and honour backslash escapes.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    current.push(q);
                }
            }
            '"' => {
                in_word = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        _ => current.push(q),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            _ => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedRunner;

    #[test]
    fn test_split_plain_words() {
        assert_eq!(
            split_command_line("npx tsc  --noEmit"),
            vec!["npx", "tsc", "--noEmit"]
        );
    }

    #[test]
    fn test_split_quoted_words() {
        assert_eq!(
            split_command_line(r#"eslint "src dir" 'a b' -f x"#),
            vec!["eslint", "src dir", "a b", "-f", "x"]
        );
    }

    #[test]
    fn test_split_escapes_and_empty_quotes() {
        assert_eq!(split_command_line(r#"echo \"hi\" """#), vec!["echo", "\"hi\"", ""]);
    }

    #[test]
    fn test_split_empty_line() {
        assert!(split_command_line("   ").is_empty());
    }

    #[test]
    fn test_from_argv_rejects_empty() {
        let err = Invocation::from_argv(&[], Path::new(".")).unwrap_err();
        assert!(matches!(err, MonitorError::EmptyCommand(_)));
    }

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("git", ["fetch", "origin"], Path::new("."));
        assert_eq!(inv.display(), "git fetch origin");
    }

    #[tokio::test]
    async fn test_capture_ignores_exit_code() {
        let runner = ScriptedRunner::new().respond("tsc", 2, "a.ts(1,1): error TS1: x\n");
        let inv = Invocation::new("tsc", Vec::<String>::new(), Path::new("."));
        let out = capture_output(&runner, &inv).await;
        assert!(out.contains("TS1"));
    }

    #[tokio::test]
    async fn test_capture_spawn_failure_is_empty() {
        let runner = ScriptedRunner::new().unspawnable("missing-tool");
        let inv = Invocation::new("missing-tool", Vec::<String>::new(), Path::new("."));
        assert_eq!(capture_output(&runner, &inv).await, "");
    }
}
