//! Hosting platform API surface consumed by tsmon.
//!
//! These traits and types describe only what the resolver and publisher
//! need: comments, reviews, check runs and the pull requests associated with
//! a commit. Implementations live outside this crate; an in-memory fake is
//! provided in [`crate::fakes`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::event::BaseReference;

/// Result type for hosting API calls.
pub type HostingResult<T> = std::result::Result<T, HostingError>;

/// Errors returned by hosting API implementations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HostingError {
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("hosting api not configured: {0}")]
    NotConfigured(String),
}

/// A conversation comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    pub author: String,
    pub body: String,
}

/// A pull request as returned by commit association lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub state: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub head_sha: String,
    pub base: BaseReference,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.state.eq_ignore_ascii_case("open")
    }
}

/// Check run conclusion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
}

impl CheckConclusion {
    pub fn from_failed(failed: bool) -> Self {
        if failed {
            CheckConclusion::Failure
        } else {
            CheckConclusion::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckConclusion::Success => "success",
            CheckConclusion::Failure => "failure",
        }
    }
}

/// Check run lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunState {
    InProgress,
    Completed,
}

/// Title and body shown on a completed check run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckOutput {
    pub title: String,
    pub summary: String,
}

/// Hosting platform operations used by tsmon.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// All comments on a conversation, oldest first.
    async fn list_comments(&self, issue_number: u64) -> HostingResult<Vec<Comment>>;

    async fn create_comment(&self, issue_number: u64, body: &str) -> HostingResult<Comment>;

    async fn update_comment(&self, comment_id: u64, body: &str) -> HostingResult<Comment>;

    /// Submit a comment-only review on a pull request.
    async fn create_review(&self, pull_number: u64, body: &str) -> HostingResult<()>;

    /// Create a check run in the `in_progress` state; returns its id.
    async fn create_check_run(&self, name: &str, head_sha: &str) -> HostingResult<u64>;

    async fn complete_check_run(
        &self,
        check_run_id: u64,
        conclusion: CheckConclusion,
        output: &CheckOutput,
    ) -> HostingResult<()>;

    /// Pull requests associated with a commit, in API order.
    async fn list_pull_requests_for_commit(&self, sha: &str) -> HostingResult<Vec<PullRequest>>;
}
