//! GitHub connection settings.

use serde::{Deserialize, Serialize};

use crate::error::GitHubError;
use crate::Result;

/// Default REST endpoint for github.com.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubConfig {
    /// REST API base URL, without trailing slash
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    /// Authentication token
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl GitHubConfig {
    /// Create config for a specific repository on github.com
    pub fn new(owner: &str, repo: &str) -> Self {
        GitHubConfig {
            api_url: DEFAULT_API_URL.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: None,
        }
    }

    /// Read `GITHUB_API_URL`, `GITHUB_REPOSITORY` and the token
    /// (`INPUT_REPO-TOKEN`, then `GITHUB_TOKEN`) from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`GitHubConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let slug = non_empty("GITHUB_REPOSITORY").ok_or(GitHubError::MissingEnv("GITHUB_REPOSITORY"))?;
        let (owner, repo) = parse_repository(&slug)?;

        let mut config = Self::new(&owner, &repo);
        if let Some(url) = non_empty("GITHUB_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        config.token = non_empty("INPUT_REPO-TOKEN").or_else(|| non_empty("GITHUB_TOKEN"));
        Ok(config)
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Point at a different API host (GitHub Enterprise).
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// `{api_url}/repos/{owner}/{repo}{path}`
    pub fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, path)
    }
}

/// Split `owner/repo`.
pub fn parse_repository(slug: &str) -> Result<(String, String)> {
    match slug.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GitHubError::InvalidRepository(slug.to_string())),
    }
}
