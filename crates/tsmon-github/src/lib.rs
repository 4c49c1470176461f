//! tsmon-github: GitHub integration for tsmon
//!
//! Implements the hosting API on top of the GitHub REST API and loads the
//! triggering event from the Actions runner environment.

pub mod client;
pub mod config;
pub mod error;
pub mod event;

pub use client::{sanitize_error_body, GitHubClient};
pub use config::{parse_repository, GitHubConfig, DEFAULT_API_URL};
pub use error::GitHubError;
pub use event::{is_unsupported, load_event, EventSource};

/// Result type for tsmon-github operations
pub type Result<T> = std::result::Result<T, GitHubError>;
