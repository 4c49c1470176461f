//! Trigger event loading from the Actions runner environment.

use std::path::{Path, PathBuf};
use tracing::debug;

use tsmon_core::{MonitorError, TriggerEvent};

use crate::error::GitHubError;

/// Where the runner put the triggering event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    pub name: String,
    pub path: PathBuf,
}

impl EventSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Read `GITHUB_EVENT_NAME` and `GITHUB_EVENT_PATH`.
    pub fn from_env() -> crate::Result<Self> {
        let name = std::env::var("GITHUB_EVENT_NAME")
            .map_err(|_| GitHubError::MissingEnv("GITHUB_EVENT_NAME"))?;
        let path = std::env::var("GITHUB_EVENT_PATH")
            .map_err(|_| GitHubError::MissingEnv("GITHUB_EVENT_PATH"))?;
        Ok(Self::new(name, path))
    }

    /// Parse the payload file into a [`TriggerEvent`].
    pub fn load(&self) -> tsmon_core::Result<TriggerEvent> {
        load_event(&self.name, &self.path)
    }
}

/// Read the JSON payload at `path` and parse it as a `name` event.
pub fn load_event(name: &str, path: &Path) -> tsmon_core::Result<TriggerEvent> {
    let raw = std::fs::read_to_string(path)?;
    let payload: serde_json::Value = serde_json::from_str(&raw)?;
    debug!(event_name = %name, payload = %payload, "trigger event payload");

    let event = TriggerEvent::from_payload(name, &payload)?;
    if let TriggerEvent::Push { git_ref, .. } = &event {
        debug!(git_ref = ?git_ref, "push event");
    }
    Ok(event)
}

/// True when `err` means the event itself is not one tsmon can handle.
pub fn is_unsupported(err: &MonitorError) -> bool {
    matches!(err, MonitorError::UnsupportedEvent { .. })
}
