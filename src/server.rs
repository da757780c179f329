use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{schemars, tool, tool_handler, tool_router, ServerHandler};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::client::GithubClient;
use crate::config::Config;
use crate::error::GithubToolError;
use crate::tools::{self, IssueState, DEFAULT_LIMIT, DEFAULT_REF};

#[derive(Clone)]
pub struct GithubToolServer {
    client: Arc<GithubClient>,
    api_base: Url,
    tool_router: ToolRouter<Self>,
}

// -- Tool parameter types --

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_ref() -> String {
    DEFAULT_REF.to_string()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RepoParams {
    #[schemars(description = "Repository owner (user or org)")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIssuesParams {
    #[schemars(description = "Repository owner (user or org)")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,

    #[schemars(description = "Filter by state: open, closed, or all (default: open)")]
    #[serde(default)]
    pub state: IssueState,

    #[schemars(description = "Maximum number of issues, clamped to 1..=50 (default: 20)")]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateIssueParams {
    #[schemars(description = "Repository owner (user or org)")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,

    #[schemars(description = "Issue title")]
    pub title: String,

    #[schemars(description = "Issue body in markdown (default: empty)")]
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFileParams {
    #[schemars(description = "Repository owner (user or org)")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,

    #[schemars(description = "File path within the repository")]
    pub path: String,

    #[schemars(description = "Git ref (branch, tag, or SHA). Defaults to main")]
    #[serde(default = "default_ref", rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchCodeParams {
    #[schemars(description = "Repository owner (user or org)")]
    pub owner: String,

    #[schemars(description = "Repository name")]
    pub repo: String,

    #[schemars(description = "Search query (GitHub code search syntax), scoped to the repository")]
    pub query: String,

    #[schemars(description = "Maximum number of results, clamped to 1..=50 (default: 20)")]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl GithubToolServer {
    pub fn new(config: &Config) -> Result<Self, GithubToolError> {
        Ok(Self {
            client: Arc::new(GithubClient::new(config)?),
            api_base: config.api_base.clone(),
            tool_router: Self::tool_router(),
        })
    }

    fn err(&self, e: GithubToolError) -> ErrorData {
        e.to_mcp_error()
    }

    pub async fn do_get_repo(&self, params: &RepoParams) -> Result<Value, GithubToolError> {
        let request = tools::get_repo_request(&self.api_base, &params.owner, &params.repo)?;
        self.client.send(&request).await
    }

    pub async fn do_list_issues(
        &self,
        params: &ListIssuesParams,
    ) -> Result<Vec<Value>, GithubToolError> {
        let request = tools::list_issues_request(
            &self.api_base,
            &params.owner,
            &params.repo,
            params.state,
            params.limit,
        )?;
        let issues = tools::issues_only(self.client.send(&request).await?)?;
        tracing::debug!(
            repo = %format!("{}/{}", params.owner, params.repo),
            count = issues.len(),
            "Listed issues"
        );
        Ok(issues)
    }

    pub async fn do_create_issue(
        &self,
        params: &CreateIssueParams,
    ) -> Result<Value, GithubToolError> {
        let request = tools::create_issue_request(
            &self.api_base,
            &params.owner,
            &params.repo,
            &params.title,
            &params.body,
        )?;
        let issue = self.client.send(&request).await?;
        tracing::info!(
            repo = %format!("{}/{}", params.owner, params.repo),
            number = issue.get("number").and_then(serde_json::Value::as_u64),
            "Created issue"
        );
        Ok(issue)
    }

    pub async fn do_get_file(&self, params: &GetFileParams) -> Result<Value, GithubToolError> {
        let request = tools::get_file_request(
            &self.api_base,
            &params.owner,
            &params.repo,
            &params.path,
            &params.git_ref,
        )?;
        self.client.send(&request).await
    }

    pub async fn do_search_code(
        &self,
        params: &SearchCodeParams,
    ) -> Result<Vec<Value>, GithubToolError> {
        let request = tools::search_code_request(
            &self.api_base,
            &params.owner,
            &params.repo,
            &params.query,
            params.limit,
        )?;
        Ok(tools::search_items(self.client.send(&request).await?))
    }
}

fn json_result<T: serde::Serialize>(value: &T) -> CallToolResult {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    CallToolResult::success(vec![Content::text(text)])
}

// -- MCP tool handlers (thin wrappers calling do_* methods) --

#[tool_router]
impl GithubToolServer {
    #[tool(
        name = "github_get_repo",
        description = "Fetch basic repository metadata."
    )]
    async fn github_get_repo(
        &self,
        Parameters(params): Parameters<RepoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let repo = self.do_get_repo(&params).await.map_err(|e| self.err(e))?;
        Ok(json_result(&repo))
    }

    #[tool(
        name = "github_list_issues",
        description = "List issues (excluding PRs)."
    )]
    async fn github_list_issues(
        &self,
        Parameters(params): Parameters<ListIssuesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let issues = self
            .do_list_issues(&params)
            .await
            .map_err(|e| self.err(e))?;
        Ok(json_result(&issues))
    }

    #[tool(
        name = "github_create_issue",
        description = "Create an issue. Requires token with appropriate repo permissions."
    )]
    async fn github_create_issue(
        &self,
        Parameters(params): Parameters<CreateIssueParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let issue = self
            .do_create_issue(&params)
            .await
            .map_err(|e| self.err(e))?;
        Ok(json_result(&issue))
    }

    #[tool(
        name = "github_get_file",
        description = "Fetch file metadata + content (base64) from a repo path."
    )]
    async fn github_get_file(
        &self,
        Parameters(params): Parameters<GetFileParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let file = self.do_get_file(&params).await.map_err(|e| self.err(e))?;
        Ok(json_result(&file))
    }

    #[tool(
        name = "github_search_code",
        description = "Search code within a single repo."
    )]
    async fn github_search_code(
        &self,
        Parameters(params): Parameters<SearchCodeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let items = self
            .do_search_code(&params)
            .await
            .map_err(|e| self.err(e))?;
        Ok(json_result(&items))
    }
}

#[tool_handler]
impl ServerHandler for GithubToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "github-tool-adapter".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "GitHub repository tools. Use github_get_repo for repo metadata, \
                 github_list_issues to list issues (pull requests excluded), \
                 github_create_issue to open an issue, github_get_file to fetch a file \
                 (base64 content), and github_search_code to search code within one repo."
                    .to_string(),
            ),
        }
    }
}
