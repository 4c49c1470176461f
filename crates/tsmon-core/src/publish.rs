//! Idempotent report publishing: one check run and one comment per pull request.
//!
//! Both artifacts are found again on later runs, the comment through a
//! marker embedded in its body. Every failure here is logged and swallowed;
//! publishing never changes the outcome of a run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::event::ReportTarget;
use crate::hosting::{CheckConclusion, CheckOutput, HostingApi, HostingResult};
use crate::obs::emit_report_failed;

/// Hidden marker identifying tsmon's own comment.
pub const REPORT_MARKER: &str = "<!-- tsmon:report -->";

/// Check run name and output title.
pub const CHECK_NAME: &str = "Typescript Monitor";

/// Default author login of comments posted with an Actions token.
pub const DEFAULT_IDENTITY: &str = "github-actions[bot]";

/// An open check run. Completing it consumes the handle, so a check run
/// cannot be completed twice.
#[derive(Debug, PartialEq, Eq)]
pub struct CheckRunHandle {
    id: u64,
}

impl CheckRunHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One step of the comment fallback chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentStep {
    UpdateExisting(u64),
    Create,
    Review,
}

/// How the comment ended up being published.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentOutcome {
    Updated(u64),
    Created(u64),
    Reviewed,
    Failed,
}

/// Ordered fallback chain for a comment, given the id of our existing one.
pub fn comment_plan(existing: Option<u64>) -> Vec<CommentStep> {
    existing
        .map(CommentStep::UpdateExisting)
        .into_iter()
        .chain([CommentStep::Create, CommentStep::Review])
        .collect()
}

/// Append `marker` to `body` unless it is already there.
pub fn ensure_marker(body: &str, marker: &str) -> String {
    if body.contains(marker) {
        body.to_string()
    } else {
        format!("{body}\n\n{marker}")
    }
}

/// Publishes the check run and comment for one pull request.
pub struct ReportPublisher<'a> {
    api: &'a dyn HostingApi,
    identity: String,
    marker: String,
}

impl<'a> ReportPublisher<'a> {
    pub fn new(api: &'a dyn HostingApi, identity: impl Into<String>) -> Self {
        Self {
            api,
            identity: identity.into(),
            marker: REPORT_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    // -- check run ----------------------------------------------------------

    /// Create the check run in `in_progress` against the head commit.
    pub async fn open_check(&self, target: &ReportTarget) -> Option<CheckRunHandle> {
        match self.api.create_check_run(CHECK_NAME, &target.head_sha).await {
            Ok(id) => {
                info!(check_run_id = id, head_sha = %target.head_sha, "check run opened");
                Some(CheckRunHandle { id })
            }
            Err(e) => {
                emit_report_failed("check_run.create", &e);
                None
            }
        }
    }

    /// Complete the check run with its conclusion and summary.
    pub async fn complete_check(
        &self,
        handle: CheckRunHandle,
        conclusion: CheckConclusion,
        summary: &str,
    ) -> bool {
        let output = CheckOutput {
            title: CHECK_NAME.to_string(),
            summary: summary.to_string(),
        };
        match self
            .api
            .complete_check_run(handle.id, conclusion, &output)
            .await
        {
            Ok(()) => {
                info!(check_run_id = handle.id, conclusion = conclusion.as_str(), "check run completed");
                true
            }
            Err(e) => {
                emit_report_failed("check_run.complete", &e);
                false
            }
        }
    }

    // -- comment ------------------------------------------------------------

    /// Id of the most recent comment authored by us that carries the marker.
    pub async fn find_existing_comment(&self, issue_number: u64) -> HostingResult<Option<u64>> {
        let comments = self.api.list_comments(issue_number).await?;
        Ok(comments
            .iter()
            .rev()
            .find(|c| c.author == self.identity && c.body.contains(&self.marker))
            .map(|c| c.id))
    }

    /// Update our comment in place, or create it, or fall back to a review.
    ///
    /// Nothing is posted when the existing comments cannot be listed.
    pub async fn publish_comment(&self, target: &ReportTarget, body: &str) -> CommentOutcome {
        let body = ensure_marker(body, &self.marker);
        let existing = match self.find_existing_comment(target.pull_number).await {
            Ok(existing) => existing,
            Err(e) => {
                emit_report_failed("comment.list", &e);
                return CommentOutcome::Failed;
            }
        };

        for step in comment_plan(existing) {
            debug!(step = ?step, pull_number = target.pull_number, "publishing comment");
            let result = match step {
                CommentStep::UpdateExisting(id) => self
                    .api
                    .update_comment(id, &body)
                    .await
                    .map(|c| CommentOutcome::Updated(c.id)),
                CommentStep::Create => self
                    .api
                    .create_comment(target.pull_number, &body)
                    .await
                    .map(|c| CommentOutcome::Created(c.id)),
                CommentStep::Review => self
                    .api
                    .create_review(target.pull_number, &body)
                    .await
                    .map(|()| CommentOutcome::Reviewed),
            };
            match result {
                Ok(outcome) => {
                    info!(outcome = ?outcome, pull_number = target.pull_number, "comment published");
                    return outcome;
                }
                Err(e) => emit_report_failed(step_name(step), &e),
            }
        }
        CommentOutcome::Failed
    }
}

fn step_name(step: CommentStep) -> &'static str {
    match step {
        CommentStep::UpdateExisting(_) => "comment.update",
        CommentStep::Create => "comment.create",
        CommentStep::Review => "review.create",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_plan_with_existing() {
        assert_eq!(
            comment_plan(Some(7)),
            vec![
                CommentStep::UpdateExisting(7),
                CommentStep::Create,
                CommentStep::Review
            ]
        );
    }

    #[test]
    fn test_comment_plan_without_existing() {
        assert_eq!(
            comment_plan(None),
            vec![CommentStep::Create, CommentStep::Review]
        );
    }

    #[test]
    fn test_ensure_marker() {
        let body = ensure_marker("hello", REPORT_MARKER);
        assert!(body.ends_with(REPORT_MARKER));
        assert_eq!(ensure_marker(&body, REPORT_MARKER), body);
    }
}
