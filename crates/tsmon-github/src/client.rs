//! GitHub REST implementation of [`HostingApi`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tsmon_core::{
    BaseReference, CheckConclusion, CheckOutput, Comment, HostingApi, HostingResult, PullRequest,
};

use crate::config::GitHubConfig;
use crate::error::GitHubError;
use crate::Result;

const USER_AGENT: &str = concat!("tsmon/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// Page size for list endpoints.
pub const PER_PAGE: usize = 100;

/// Maximum length for error body content in error messages
const MAX_ERROR_BODY_LEN: usize = 200;

/// Truncate an API error body and redact anything that looks like a secret.
pub fn sanitize_error_body(body: &str) -> String {
    const SECRET_PATTERNS: &[&str] = &[
        "token",
        "secret",
        "password",
        "credential",
        "bearer",
        "ghp_",
        "gho_",
        "ghs_",
        "github_pat_",
    ];

    let truncated = match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    };

    let lower = truncated.to_lowercase();
    if SECRET_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "(error details redacted - may contain sensitive data)".to_string();
    }
    truncated
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<ApiUser>,
}

impl From<ApiComment> for Comment {
    fn from(c: ApiComment) -> Self {
        Comment {
            id: c.id,
            author: c.user.map(|u| u.login).unwrap_or_default(),
            body: c.body.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiCommitRef {
    sha: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    state: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    head: ApiCommitRef,
    base: ApiCommitRef,
}

impl From<ApiPullRequest> for PullRequest {
    fn from(pr: ApiPullRequest) -> Self {
        PullRequest {
            number: pr.number,
            state: pr.state,
            updated_at: pr.updated_at,
            head_sha: pr.head.sha.unwrap_or_default(),
            base: BaseReference::new(pr.base.sha, pr.base.git_ref),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiCheckRun {
    id: u64,
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    body: &'a str,
    event: &'static str,
}

#[derive(Debug, Serialize)]
struct CreateCheckRunRequest<'a> {
    name: &'a str,
    head_sha: &'a str,
    status: &'static str,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CheckRunOutputRequest<'a> {
    title: &'a str,
    summary: &'a str,
}

#[derive(Debug, Serialize)]
struct CompleteCheckRunRequest<'a> {
    status: &'static str,
    conclusion: &'static str,
    completed_at: DateTime<Utc>,
    output: CheckRunOutputRequest<'a>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// GitHub REST client for one repository.
pub struct GitHubClient {
    config: GitHubConfig,
    http_client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client. Fails without a token.
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let token = config.token.as_deref().ok_or(GitHubError::TokenMissing)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::Http("token contains invalid header characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(GitHubClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.repo_url(path);
        debug!(method = %method, url = %url, "github request");
        self.http_client.request(method, url)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            let bytes = resp.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_error) => sanitize_error_body(&api_error.message),
            Err(_) => sanitize_error_body(&body),
        };
        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn list_comments_paged(&self, issue_number: u64) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();
        for page in 1.. {
            let batch: Vec<ApiComment> = self
                .send(
                    self.request(Method::GET, &format!("/issues/{issue_number}/comments"))
                        .query(&[("per_page", PER_PAGE), ("page", page)]),
                )
                .await?;
            let last = batch.len() < PER_PAGE;
            comments.extend(batch.into_iter().map(Comment::from));
            if last {
                break;
            }
        }
        Ok(comments)
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn list_comments(&self, issue_number: u64) -> HostingResult<Vec<Comment>> {
        Ok(self.list_comments_paged(issue_number).await?)
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> HostingResult<Comment> {
        let comment: ApiComment = self
            .send(
                self.request(Method::POST, &format!("/issues/{issue_number}/comments"))
                    .json(&CommentRequest { body }),
            )
            .await?;
        Ok(comment.into())
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> HostingResult<Comment> {
        let comment: ApiComment = self
            .send(
                self.request(Method::PATCH, &format!("/issues/comments/{comment_id}"))
                    .json(&CommentRequest { body }),
            )
            .await?;
        Ok(comment.into())
    }

    async fn create_review(&self, pull_number: u64, body: &str) -> HostingResult<()> {
        let _: serde_json::Value = self
            .send(
                self.request(Method::POST, &format!("/pulls/{pull_number}/reviews"))
                    .json(&ReviewRequest {
                        body,
                        event: "COMMENT",
                    }),
            )
            .await?;
        Ok(())
    }

    async fn create_check_run(&self, name: &str, head_sha: &str) -> HostingResult<u64> {
        let run: ApiCheckRun = self
            .send(
                self.request(Method::POST, "/check-runs")
                    .json(&CreateCheckRunRequest {
                        name,
                        head_sha,
                        status: "in_progress",
                        started_at: Utc::now(),
                    }),
            )
            .await?;
        Ok(run.id)
    }

    async fn complete_check_run(
        &self,
        check_run_id: u64,
        conclusion: CheckConclusion,
        output: &CheckOutput,
    ) -> HostingResult<()> {
        let _: serde_json::Value = self
            .send(
                self.request(Method::PATCH, &format!("/check-runs/{check_run_id}"))
                    .json(&CompleteCheckRunRequest {
                        status: "completed",
                        conclusion: conclusion.as_str(),
                        completed_at: Utc::now(),
                        output: CheckRunOutputRequest {
                            title: &output.title,
                            summary: &output.summary,
                        },
                    }),
            )
            .await?;
        Ok(())
    }

    async fn list_pull_requests_for_commit(&self, sha: &str) -> HostingResult<Vec<PullRequest>> {
        let prs: Vec<ApiPullRequest> = self
            .send(
                self.request(Method::GET, &format!("/commits/{sha}/pulls"))
                    .query(&[("per_page", PER_PAGE)]),
            )
            .await?;
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_requires_token() {
        let err = GitHubClient::new(GitHubConfig::new("acme", "web")).err().unwrap();
        assert!(matches!(err, GitHubError::TokenMissing));
    }

    #[test]
    fn test_client_builds_with_token() {
        let client = GitHubClient::new(GitHubConfig::new("acme", "web").with_token("t0k")).unwrap();
        assert_eq!(client.config().owner, "acme");
    }

    #[test]
    fn test_parse_comment() {
        let raw = json!({
            "id": 11,
            "body": "## Typescript Monitor\n<!-- tsmon:report -->",
            "user": { "login": "github-actions[bot]", "type": "Bot" },
            "created_at": "2024-01-01T00:00:00Z"
        });
        let comment: Comment = serde_json::from_value::<ApiComment>(raw).unwrap().into();
        assert_eq!(comment.id, 11);
        assert_eq!(comment.author, "github-actions[bot]");
        assert!(comment.body.contains("tsmon:report"));
    }

    #[test]
    fn test_parse_comment_without_user() {
        let comment: Comment = serde_json::from_value::<ApiComment>(json!({ "id": 3, "user": null }))
            .unwrap()
            .into();
        assert_eq!(comment.author, "");
        assert_eq!(comment.body, "");
    }

    #[test]
    fn test_parse_pull_request() {
        let raw = json!({
            "number": 7,
            "state": "open",
            "updated_at": "2024-03-01T12:00:00Z",
            "head": { "sha": "h1", "ref": "feature" },
            "base": { "sha": "b1", "ref": "main" }
        });
        let pr: PullRequest = serde_json::from_value::<ApiPullRequest>(raw).unwrap().into();
        assert_eq!(pr.number, 7);
        assert!(pr.is_open());
        assert!(pr.updated_at.is_some());
        assert_eq!(pr.head_sha, "h1");
        assert_eq!(pr.base.sha.as_deref(), Some("b1"));
        assert_eq!(pr.base.git_ref.as_deref(), Some("main"));
    }

    #[test]
    fn test_check_run_requests_serialize() {
        let create = serde_json::to_value(CreateCheckRunRequest {
            name: "Typescript Monitor",
            head_sha: "abc",
            status: "in_progress",
            started_at: Utc::now(),
        })
        .unwrap();
        assert_eq!(create["status"], "in_progress");
        assert!(create["started_at"].is_string());

        let complete = serde_json::to_value(CompleteCheckRunRequest {
            status: "completed",
            conclusion: CheckConclusion::Failure.as_str(),
            completed_at: Utc::now(),
            output: CheckRunOutputRequest {
                title: "Typescript Monitor",
                summary: "x",
            },
        })
        .unwrap();
        assert_eq!(complete["conclusion"], "failure");
        assert_eq!(complete["output"]["summary"], "x");
    }

    #[test]
    fn test_review_request_is_comment_only() {
        let v = serde_json::to_value(ReviewRequest {
            body: "b",
            event: "COMMENT",
        })
        .unwrap();
        assert_eq!(v, json!({ "body": "b", "event": "COMMENT" }));
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(500);
        let out = sanitize_error_body(&long);
        assert!(out.ends_with("... (truncated)"));
        assert!(out.len() < 250);
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert!(sanitize_error_body(&long).ends_with("(truncated)"));
    }

    #[test]
    fn test_sanitize_redacts_secrets() {
        let out = sanitize_error_body("Bad credentials for token ghs_abcdef");
        assert!(!out.contains("ghs_"));
        assert!(out.contains("redacted"));
    }

    #[test]
    fn test_sanitize_keeps_plain_messages() {
        assert_eq!(sanitize_error_body("Not Found"), "Not Found");
    }
}
