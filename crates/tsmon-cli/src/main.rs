//! tsmon - TypeScript Monitor
//!
//! Measures type-checker and linter error counts on the current commit and
//! on its base, fails the build when either went up, and reports the result
//! back to the pull request.
//!
//! Every option mirrors an Actions input and can be set through the
//! matching `INPUT_*` variable.
//!
//! Exit codes: 0 = no regression or nothing to compare, 1 = regression,
//! 2 = fatal error.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};

use tsmon_ci::{
    parse_input_bool, MonitorConfig, MonitorPipeline, PipelineContext, RunOutcome, ShellRunner,
    DEFAULT_LINT_SCRIPT, DEFAULT_TS_SCRIPT,
};
use tsmon_core::{HostingApi, DEFAULT_IDENTITY};
use tsmon_github::{EventSource, GitHubClient, GitHubConfig};

#[derive(Parser, Debug)]
#[command(name = "tsmon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fail the build when TypeScript or ESLint errors increase", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Compare type-checker errors ("true" enables)
    #[arg(long, env = "INPUT_CHECK-TYPESCRIPT", default_value = "true")]
    check_typescript: String,

    /// Compare linter errors ("true" enables)
    #[arg(long, env = "INPUT_CHECK-LINTING", default_value = "false")]
    check_linting: String,

    /// Type-checker command
    #[arg(long, env = "INPUT_TS-SCRIPT", default_value = DEFAULT_TS_SCRIPT)]
    ts_script: String,

    /// Linter command
    #[arg(long, env = "INPUT_LINT-SCRIPT", default_value = DEFAULT_LINT_SCRIPT)]
    lint_script: String,

    /// Project directory, relative to the current directory
    #[arg(long, env = "INPUT_CWD")]
    cwd: Option<PathBuf>,

    /// Token for the GitHub API (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_REPO-TOKEN", hide_env_values = true)]
    repo_token: Option<String>,

    /// Login our comments are posted as
    #[arg(long, env = "INPUT_COMMENT-AUTHOR", default_value = DEFAULT_IDENTITY)]
    comment_author: String,

    /// Name of the triggering event
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: String,

    /// Path to the triggering event's JSON payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    /// Also write the comparison as JSON to this file
    #[arg(long, env = "TSMON_REPORT_JSON")]
    report_json: Option<PathBuf>,

    /// Step summary file to append the report to
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    step_summary: Option<PathBuf>,
}

impl Cli {
    fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            check_typescript: parse_input_bool(&self.check_typescript),
            check_linting: parse_input_bool(&self.check_linting),
            ts_script: self.ts_script.clone(),
            lint_script: self.lint_script.clone(),
            cwd: self.cwd.clone(),
            comment_identity: self.comment_author.clone(),
            report_json: self.report_json.clone(),
            step_summary: self.step_summary.clone(),
        }
    }

    fn token(&self) -> Option<String> {
        self.repo_token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tsmon_core::init_tracing(cli.json, level);

    match run(&cli).await {
        Ok(outcome) => {
            if let RunOutcome::Compared(result) = &outcome {
                for violation in &result.verdict.violations {
                    println!("{}", error_annotation(violation));
                }
            }
            ExitCode::from(exit_status(Some(&outcome)))
        }
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "tsmon failed");
            println!("{}", error_annotation(&message));
            ExitCode::from(exit_status(None))
        }
    }
}

async fn run(cli: &Cli) -> Result<RunOutcome> {
    let config = cli.monitor_config();
    let event = EventSource::new(&cli.event_name, &cli.event_path)
        .load()
        .with_context(|| format!("Failed to load {} event", cli.event_name))?;

    let client = github_client(cli.token());
    let runner = ShellRunner::new();
    let base_dir = std::env::current_dir().context("Failed to get current directory")?;

    let ctx = PipelineContext {
        runner: &runner,
        api: client.as_ref().map(|c| c as &dyn HostingApi),
        config: &config,
        event: &event,
        base_dir,
    };
    let outcome = MonitorPipeline::run(&ctx).await?;

    match &outcome {
        RunOutcome::NoBase { .. } => info!("nothing to compare against"),
        RunOutcome::Compared(result) => {
            info!(
                run_id = %result.run_id,
                passed = result.verdict.passed,
                duration_ms = result.duration_ms,
                "{}",
                result.verdict.message
            );
        }
    }
    Ok(outcome)
}

/// A client when a token and repository are available; reporting is off otherwise.
fn github_client(token: Option<String>) -> Option<GitHubClient> {
    let Some(token) = token else {
        warn!("no GitHub token, reporting disabled");
        return None;
    };
    let built = GitHubConfig::from_env().and_then(|c| GitHubClient::new(c.with_token(&token)));
    match built {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "GitHub client unavailable, reporting disabled");
            None
        }
    }
}

/// `None` means the run failed fatally.
fn exit_status(outcome: Option<&RunOutcome>) -> u8 {
    match outcome {
        Some(o) if o.passed() => 0,
        Some(_) => 1,
        None => 2,
    }
}

/// A workflow `::error::` command with its message escaped.
fn error_annotation(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec![
            "tsmon",
            "--event-name",
            "pull_request",
            "--event-path",
            "/tmp/event.json",
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("parse")
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_explicit_flags() {
        let cli = parse(&[
            "--check-typescript",
            "false",
            "--check-linting",
            "true",
            "--lint-script",
            "yarn lint",
            "--cwd",
            "web",
        ]);
        let config = cli.monitor_config();
        assert!(!config.check_typescript);
        assert!(config.check_linting);
        assert_eq!(config.lint_script, "yarn lint");
        assert_eq!(config.cwd, Some(PathBuf::from("web")));
    }

    #[test]
    fn test_only_literal_true_enables() {
        let cli = parse(&["--check-typescript", "yes", "--check-linting", "True"]);
        let config = cli.monitor_config();
        assert!(!config.check_typescript);
        assert!(!config.check_linting);
    }

    #[test]
    fn test_explicit_token_wins() {
        let cli = parse(&["--repo-token", "abc"]);
        assert_eq!(cli.token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_error_annotation_escapes() {
        assert_eq!(
            error_annotation("100% broken\nsecond line"),
            "::error::100%25 broken%0Asecond line"
        );
    }

    #[test]
    fn test_exit_codes() {
        let no_base = RunOutcome::NoBase {
            run_id: "r".to_string(),
        };
        assert_eq!(exit_status(Some(&no_base)), 0);
        assert_eq!(exit_status(None), 2);
    }

    #[tokio::test]
    async fn test_unsupported_event_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, "{}").unwrap();
        let cli = Cli::try_parse_from([
            "tsmon",
            "--event-name",
            "workflow_dispatch",
            "--event-path",
            path.to_str().unwrap(),
        ])
        .unwrap();

        let err = run(&cli).await.unwrap_err();
        assert!(format!("{err:#}").contains("unsupported event name: workflow_dispatch"));
    }
}
