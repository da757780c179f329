//! Runtime configuration: the resolved GitHub credential plus connection settings.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{GithubToolError, Result};

/// Token variables, checked in order. The first non-empty value wins.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_PAT", "GITHUB_TOKEN"];

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Resolve the bearer token through `lookup`, trimming whitespace.
///
/// A variable set to an empty or whitespace-only value counts as unset.
pub fn resolve_token<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_ENV_VARS
        .iter()
        .find_map(|name| {
            let value = lookup(name)?;
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                tracing::debug!(env = *name, "Resolved GitHub token");
                Some(trimmed.to_string())
            }
        })
        .ok_or(GithubToolError::MissingToken)
}

#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub api_base: Url,
    pub timeout: Duration,
}

impl Config {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(GithubToolError::MissingToken);
        }
        Ok(Self {
            token,
            api_base: parse_api_url(DEFAULT_API_URL)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::new(resolve_token(|name| std::env::var(name).ok())?)
    }

    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        self.api_base = parse_api_url(api_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(GithubToolError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| GithubToolError::Config(format!("invalid API URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(GithubToolError::Config(format!(
            "API URL must be an absolute http(s) URL, got '{}'",
            raw
        ))),
    }
}
