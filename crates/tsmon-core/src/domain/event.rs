//! Trigger events and the references derived from them.
//!
//! Payloads differ per event kind, so each kind gets its own variant that
//! carries only the fields valid for it. Parsing rejects every event name
//! other than `pull_request`, `pull_request_target` and `push`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::{MonitorError, Result};

/// The comparison base: a commit, a branch name, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaseReference {
    pub sha: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
}

impl BaseReference {
    pub fn new(sha: Option<String>, git_ref: Option<String>) -> Self {
        // Empty strings in payloads mean "absent".
        Self {
            sha: sha.filter(|s| !s.is_empty()),
            git_ref: git_ref.filter(|r| !r.is_empty()),
        }
    }

    /// True when neither a sha nor a ref is known.
    pub fn is_empty(&self) -> bool {
        self.sha.is_none() && self.git_ref.is_none()
    }

    /// Human-readable form for logs and errors.
    pub fn describe(&self) -> String {
        match (&self.git_ref, &self.sha) {
            (Some(r), Some(s)) => format!("{r} ({s})"),
            (Some(r), None) => r.clone(),
            (None, Some(s)) => s.clone(),
            (None, None) => "<none>".to_string(),
        }
    }
}

/// The conversation and commit that reports attach to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportTarget {
    pub pull_number: u64,
    pub head_sha: String,
}

/// Which pull request event fired.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestTrigger {
    PullRequest,
    PullRequestTarget,
}

/// A supported trigger event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TriggerEvent {
    PullRequest {
        trigger: PullRequestTrigger,
        number: u64,
        head_sha: String,
        base: BaseReference,
    },
    Push {
        /// The pushed commit.
        after: String,
        before: Option<String>,
        git_ref: Option<String>,
    },
}

#[derive(Deserialize)]
struct CommitRefPayload {
    sha: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Deserialize)]
struct PullRequestBodyPayload {
    number: u64,
    head: CommitRefPayload,
    base: CommitRefPayload,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    pull_request: PullRequestBodyPayload,
}

#[derive(Deserialize)]
struct PushPayload {
    after: Option<String>,
    before: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

impl TriggerEvent {
    /// Parse an event from its name and JSON payload.
    pub fn from_payload(event_name: &str, payload: &Value) -> Result<Self> {
        let invalid = |reason: String| MonitorError::InvalidPayload {
            event_name: event_name.to_string(),
            reason,
        };

        match event_name {
            "pull_request" | "pull_request_target" => {
                let trigger = if event_name == "pull_request" {
                    PullRequestTrigger::PullRequest
                } else {
                    PullRequestTrigger::PullRequestTarget
                };
                let parsed: PullRequestPayload =
                    serde_json::from_value(payload.clone()).map_err(|e| invalid(e.to_string()))?;
                let pr = parsed.pull_request;
                let head_sha = pr
                    .head
                    .sha
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| invalid("pull_request.head.sha is missing".to_string()))?;
                Ok(TriggerEvent::PullRequest {
                    trigger,
                    number: pr.number,
                    head_sha,
                    base: BaseReference::new(pr.base.sha, pr.base.git_ref),
                })
            }
            "push" => {
                let parsed: PushPayload =
                    serde_json::from_value(payload.clone()).map_err(|e| invalid(e.to_string()))?;
                let after = parsed
                    .after
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| invalid("after is missing".to_string()))?;
                Ok(TriggerEvent::Push {
                    after,
                    before: parsed.before,
                    git_ref: parsed.git_ref,
                })
            }
            other => Err(MonitorError::UnsupportedEvent {
                event_name: other.to_string(),
            }),
        }
    }

    /// The event name as the hosting platform spells it.
    pub fn event_name(&self) -> &'static str {
        match self {
            TriggerEvent::PullRequest {
                trigger: PullRequestTrigger::PullRequest,
                ..
            } => "pull_request",
            TriggerEvent::PullRequest {
                trigger: PullRequestTrigger::PullRequestTarget,
                ..
            } => "pull_request_target",
            TriggerEvent::Push { .. } => "push",
        }
    }

    /// The commit under test.
    pub fn head_sha(&self) -> &str {
        match self {
            TriggerEvent::PullRequest { head_sha, .. } => head_sha,
            TriggerEvent::Push { after, .. } => after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pull_request() {
        let payload = json!({
            "pull_request": {
                "number": 42,
                "head": { "sha": "head123", "ref": "feature" },
                "base": { "sha": "base456", "ref": "main" }
            }
        });
        let event = TriggerEvent::from_payload("pull_request", &payload).unwrap();
        assert_eq!(
            event,
            TriggerEvent::PullRequest {
                trigger: PullRequestTrigger::PullRequest,
                number: 42,
                head_sha: "head123".to_string(),
                base: BaseReference::new(Some("base456".into()), Some("main".into())),
            }
        );
        assert_eq!(event.event_name(), "pull_request");
        assert_eq!(event.head_sha(), "head123");
    }

    #[test]
    fn test_parse_pull_request_target() {
        let payload = json!({
            "pull_request": {
                "number": 7,
                "head": { "sha": "h" },
                "base": { "ref": "develop" }
            }
        });
        let event = TriggerEvent::from_payload("pull_request_target", &payload).unwrap();
        assert_eq!(event.event_name(), "pull_request_target");
        match event {
            TriggerEvent::PullRequest { base, .. } => {
                assert_eq!(base.git_ref.as_deref(), Some("develop"));
                assert!(base.sha.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_push() {
        let payload = json!({ "after": "abc", "before": "def", "ref": "refs/heads/main" });
        let event = TriggerEvent::from_payload("push", &payload).unwrap();
        assert_eq!(event.head_sha(), "abc");
        assert_eq!(event.event_name(), "push");
    }

    #[test]
    fn test_unsupported_event_rejected() {
        let err = TriggerEvent::from_payload("workflow_dispatch", &json!({})).unwrap_err();
        assert!(matches!(err, MonitorError::UnsupportedEvent { .. }));
    }

    #[test]
    fn test_pull_request_without_payload_is_invalid() {
        let err = TriggerEvent::from_payload("pull_request", &json!({})).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidPayload { .. }));
    }

    #[test]
    fn test_push_without_after_is_invalid() {
        let err = TriggerEvent::from_payload("push", &json!({ "ref": "refs/heads/x" })).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidPayload { .. }));
    }

    #[test]
    fn test_base_reference_empty_strings_are_absent() {
        let base = BaseReference::new(Some(String::new()), Some(String::new()));
        assert!(base.is_empty());
        assert_eq!(base.describe(), "<none>");
    }

    #[test]
    fn test_base_reference_describe() {
        let base = BaseReference::new(Some("abc".into()), Some("main".into()));
        assert_eq!(base.describe(), "main (abc)");
    }
}
