use rmcp::model::ErrorData;

#[derive(Debug, thiserror::Error)]
pub enum GithubToolError {
    #[error("Missing GitHub token. Set GITHUB_PAT (preferred) or GITHUB_TOKEN.")]
    MissingToken,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("GitHub API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed GitHub response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GithubToolError {
    pub fn to_mcp_error(&self) -> ErrorData {
        match self {
            GithubToolError::InvalidParam(_) => ErrorData::invalid_params(self.to_string(), None),
            GithubToolError::Http { status, body } => ErrorData::internal_error(
                self.to_string(),
                Some(serde_json::json!({ "status": status, "body": body })),
            ),
            GithubToolError::MissingToken
            | GithubToolError::Config(_)
            | GithubToolError::Transport(_)
            | GithubToolError::Parse(_) => ErrorData::internal_error(self.to_string(), None),
        }
    }
}

pub type Result<T> = std::result::Result<T, GithubToolError>;
