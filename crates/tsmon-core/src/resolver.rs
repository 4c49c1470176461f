//! Base resolution: which commit does this run compare against?

use tracing::{debug, info, warn};

use crate::domain::error::Result;
use crate::domain::event::{BaseReference, ReportTarget, TriggerEvent};
use crate::hosting::{HostingApi, PullRequest};

/// A base to compare against and the conversation to report on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBase {
    pub base: BaseReference,
    pub target: ReportTarget,
}

/// Outcome of base resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseResolution {
    Found(ResolvedBase),
    /// Nothing to compare against. Not an error.
    Empty,
}

/// Resolve the comparison base for a trigger event.
///
/// Pull request events carry their base in the payload. Pushes are matched
/// to an open pull request through the hosting API; without an API client
/// a push cannot be resolved and yields [`BaseResolution::Empty`].
pub async fn resolve_base(
    event: &TriggerEvent,
    api: Option<&dyn HostingApi>,
) -> Result<BaseResolution> {
    match event {
        TriggerEvent::PullRequest {
            number,
            head_sha,
            base,
            ..
        } => {
            if base.is_empty() {
                return Ok(BaseResolution::Empty);
            }
            Ok(BaseResolution::Found(ResolvedBase {
                base: base.clone(),
                target: ReportTarget {
                    pull_number: *number,
                    head_sha: head_sha.clone(),
                },
            }))
        }
        TriggerEvent::Push {
            after,
            before,
            git_ref,
        } => {
            let Some(api) = api else {
                warn!(sha = %after, "no hosting api client, cannot look up pull requests for push");
                return Ok(BaseResolution::Empty);
            };

            let prs = api.list_pull_requests_for_commit(after).await?;
            debug!(
                sha = %after,
                before = before.as_deref().unwrap_or(""),
                git_ref = git_ref.as_deref().unwrap_or(""),
                count = prs.len(),
                "pull requests associated with commit"
            );

            match select_open_pull_request(&prs) {
                Some(pr) if !pr.base.is_empty() => {
                    info!(pull_number = pr.number, base = %pr.base.describe(), "push matched to pull request");
                    Ok(BaseResolution::Found(ResolvedBase {
                        base: pr.base.clone(),
                        target: ReportTarget {
                            pull_number: pr.number,
                            head_sha: after.clone(),
                        },
                    }))
                }
                _ => Ok(BaseResolution::Empty),
            }
        }
    }
}

/// Pick the most recently updated open pull request.
///
/// Ties, and pull requests without a timestamp, keep API order.
pub fn select_open_pull_request(prs: &[PullRequest]) -> Option<&PullRequest> {
    let mut best: Option<&PullRequest> = None;
    for pr in prs.iter().filter(|pr| pr.is_open()) {
        match best {
            Some(current) if pr.updated_at <= current.updated_at => {}
            _ => best = Some(pr),
        }
    }
    best
}
