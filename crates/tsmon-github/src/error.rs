//! Error types for tsmon-github

use thiserror::Error;
use tsmon_core::HostingError;

/// Errors that can occur talking to GitHub
#[derive(Error, Debug)]
pub enum GitHubError {
    /// No token available
    #[error("GitHub token is not configured")]
    TokenMissing,

    /// Required environment variable not set
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// `GITHUB_REPOSITORY` not in `owner/repo` form
    #[error("invalid repository slug: {0}")]
    InvalidRepository(String),

    /// Non-success response
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        GitHubError::Http(err.to_string())
    }
}

impl From<GitHubError> for HostingError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Api { status, message } => HostingError::Status { status, message },
            GitHubError::Http(msg) => HostingError::Transport(msg),
            GitHubError::Json(e) => HostingError::Decode(e.to_string()),
            other @ (GitHubError::TokenMissing
            | GitHubError::MissingEnv(_)
            | GitHubError::InvalidRepository(_)) => HostingError::NotConfigured(other.to_string()),
        }
    }
}
