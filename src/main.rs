use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use github_tool_adapter::config::{Config, DEFAULT_API_URL};
use github_tool_adapter::server;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

/// MCP server exposing GitHub repository tools.
///
/// The token is read from GITHUB_PAT, falling back to GITHUB_TOKEN.
#[derive(Parser)]
#[command(name = "github-tool-adapter", version, about)]
struct Cli {
    /// GitHub REST API base URL (GitHub Enterprise: https://HOST/api/v3)
    #[arg(long = "api-url", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long = "timeout-secs", default_value = "20")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?
        .with_api_url(&cli.api_url)?
        .with_timeout(Duration::from_secs(cli.timeout_secs))?;

    tracing::info!(
        api_url = config.api_base.as_str(),
        timeout_secs = config.timeout.as_secs(),
        "Starting github-tool-adapter server"
    );

    let service = server::GithubToolServer::new(&config)?;
    let running = service.serve(stdio()).await?;
    running.waiting().await?;

    Ok(())
}
