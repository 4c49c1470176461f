//! In-memory fakes for the runner and hosting traits (testing only)
//!
//! Provides `ScriptedRunner` and `MemoryHostingApi` that satisfy the trait
//! contracts without spawning processes or touching the network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::command::{CommandOutput, CommandRunner, Invocation};
use crate::domain::error::{MonitorError, Result};
use crate::hosting::{
    CheckConclusion, CheckOutput, CheckRunState, Comment, HostingApi, HostingError,
    HostingResult, PullRequest,
};

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Scripted {
    Output(CommandOutput),
    SpawnError,
}

#[derive(Debug)]
struct Rule {
    prefix: String,
    responses: VecDeque<Scripted>,
}

/// Command runner that answers from a script instead of spawning processes.
///
/// Rules match on the start of `program args...`; the first matching rule
/// wins. A rule with several responses hands them out in order and repeats
/// the last one. Unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `prefix` with a fixed exit code and output.
    pub fn respond(self, prefix: &str, exit_code: i32, output: &str) -> Self {
        self.respond_seq(prefix, &[(exit_code, output)])
    }

    /// Answer successive matches of `prefix` with successive responses.
    pub fn respond_seq(self, prefix: &str, responses: &[(i32, &str)]) -> Self {
        let responses = responses
            .iter()
            .map(|(code, out)| {
                Scripted::Output(CommandOutput {
                    exit_code: *code,
                    output: out.to_string(),
                })
            })
            .collect();
        self.push_rule(prefix, responses)
    }

    /// Make `prefix` fail to spawn.
    pub fn unspawnable(self, prefix: &str) -> Self {
        self.push_rule(prefix, VecDeque::from([Scripted::SpawnError]))
    }

    fn push_rule(self, prefix: &str, responses: VecDeque<Scripted>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.to_string(),
            responses,
        });
        self
    }

    /// Every command run so far, as `program args...`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands run so far that start with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let line = invocation.display();
        self.calls.lock().unwrap().push(line.clone());

        let mut rules = self.rules.lock().unwrap();
        let scripted = rules
            .iter_mut()
            .find(|r| line.starts_with(&r.prefix))
            .and_then(|rule| {
                if rule.responses.len() > 1 {
                    rule.responses.pop_front()
                } else {
                    rule.responses.front().cloned()
                }
            });

        match scripted {
            Some(Scripted::Output(out)) => Ok(out),
            Some(Scripted::SpawnError) => Err(MonitorError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
            None => Ok(CommandOutput::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryHostingApi
// ---------------------------------------------------------------------------

/// A check run as recorded by [`MemoryHostingApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRunRecord {
    pub id: u64,
    pub name: String,
    pub head_sha: String,
    pub state: CheckRunState,
    pub conclusion: Option<CheckConclusion>,
    pub output: Option<CheckOutput>,
    pub completions: u32,
}

/// Which calls should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureInjection {
    pub list_comments: bool,
    pub create_comment: bool,
    pub update_comment: bool,
    pub create_review: bool,
    pub check_runs: bool,
    pub list_pull_requests: bool,
}

#[derive(Debug, Default)]
struct HostingState {
    next_id: u64,
    comments: Vec<(u64, Comment)>,
    reviews: Vec<(u64, String)>,
    check_runs: Vec<CheckRunRecord>,
    pull_requests: HashMap<String, Vec<PullRequest>>,
    failures: FailureInjection,
}

impl HostingState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory hosting API. Comments created through the API are authored by
/// the configured identity.
#[derive(Debug)]
pub struct MemoryHostingApi {
    identity: String,
    state: Mutex<HostingState>,
}

impl Default for MemoryHostingApi {
    fn default() -> Self {
        Self::new("github-actions[bot]")
    }
}

impl MemoryHostingApi {
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            state: Mutex::new(HostingState::default()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Seed an existing comment; returns its id.
    pub fn seed_comment(&self, issue_number: u64, author: &str, body: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.comments.push((
            issue_number,
            Comment {
                id,
                author: author.to_string(),
                body: body.to_string(),
            },
        ));
        id
    }

    /// Seed the pull requests associated with a commit.
    pub fn seed_pull_requests(&self, sha: &str, prs: Vec<PullRequest>) {
        self.state
            .lock()
            .unwrap()
            .pull_requests
            .insert(sha.to_string(), prs);
    }

    pub fn inject_failures(&self, failures: FailureInjection) {
        self.state.lock().unwrap().failures = failures;
    }

    pub fn comments_on(&self, issue_number: u64) -> Vec<Comment> {
        self.state
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|(n, _)| *n == issue_number)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Comments on `issue_number` whose body contains `marker`.
    pub fn marked_comments(&self, issue_number: u64, marker: &str) -> Vec<Comment> {
        self.comments_on(issue_number)
            .into_iter()
            .filter(|c| c.body.contains(marker))
            .collect()
    }

    pub fn reviews(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().reviews.clone()
    }

    pub fn check_runs(&self) -> Vec<CheckRunRecord> {
        self.state.lock().unwrap().check_runs.clone()
    }
}

fn injected(op: &str) -> HostingError {
    HostingError::Status {
        status: 403,
        message: format!("injected failure: {op}"),
    }
}

#[async_trait]
impl HostingApi for MemoryHostingApi {
    async fn list_comments(&self, issue_number: u64) -> HostingResult<Vec<Comment>> {
        if self.state.lock().unwrap().failures.list_comments {
            return Err(injected("list_comments"));
        }
        Ok(self.comments_on(issue_number))
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> HostingResult<Comment> {
        let mut state = self.state.lock().unwrap();
        if state.failures.create_comment {
            return Err(injected("create_comment"));
        }
        let comment = Comment {
            id: state.next_id(),
            author: self.identity.clone(),
            body: body.to_string(),
        };
        state.comments.push((issue_number, comment.clone()));
        Ok(comment)
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> HostingResult<Comment> {
        let mut state = self.state.lock().unwrap();
        if state.failures.update_comment {
            return Err(injected("update_comment"));
        }
        let (_, comment) = state
            .comments
            .iter_mut()
            .find(|(_, c)| c.id == comment_id)
            .ok_or_else(|| HostingError::Status {
                status: 404,
                message: format!("comment {comment_id} not found"),
            })?;
        comment.body = body.to_string();
        Ok(comment.clone())
    }

    async fn create_review(&self, pull_number: u64, body: &str) -> HostingResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failures.create_review {
            return Err(injected("create_review"));
        }
        state.reviews.push((pull_number, body.to_string()));
        Ok(())
    }

    async fn create_check_run(&self, name: &str, head_sha: &str) -> HostingResult<u64> {
        let mut state = self.state.lock().unwrap();
        if state.failures.check_runs {
            return Err(injected("create_check_run"));
        }
        let id = state.next_id();
        state.check_runs.push(CheckRunRecord {
            id,
            name: name.to_string(),
            head_sha: head_sha.to_string(),
            state: CheckRunState::InProgress,
            conclusion: None,
            output: None,
            completions: 0,
        });
        Ok(id)
    }

    async fn complete_check_run(
        &self,
        check_run_id: u64,
        conclusion: CheckConclusion,
        output: &CheckOutput,
    ) -> HostingResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failures.check_runs {
            return Err(injected("complete_check_run"));
        }
        let record = state
            .check_runs
            .iter_mut()
            .find(|r| r.id == check_run_id)
            .ok_or_else(|| HostingError::Status {
                status: 404,
                message: format!("check run {check_run_id} not found"),
            })?;
        record.state = CheckRunState::Completed;
        record.conclusion = Some(conclusion);
        record.output = Some(output.clone());
        record.completions += 1;
        Ok(())
    }

    async fn list_pull_requests_for_commit(&self, sha: &str) -> HostingResult<Vec<PullRequest>> {
        let state = self.state.lock().unwrap();
        if state.failures.list_pull_requests {
            return Err(injected("list_pull_requests_for_commit"));
        }
        Ok(state.pull_requests.get(sha).cloned().unwrap_or_default())
    }
}
