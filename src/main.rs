use anyhow::{Context, Result};
use clap::Parser;
use hg_mcp::config::Config;
use hg_mcp::mcp_server::HgMcpServer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

/// Read-only Mercurial and Phabricator introspection over MCP (stdio)
#[derive(Debug, Parser)]
#[command(name = "hg-mcp", version, long_version = LONG_VERSION)]
struct Cli {
    /// Config file (defaults to <config dir>/hg-mcp/config.toml when present)
    #[arg(long, env = "HG_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Mercurial repository root; overrides HG_REPO_ROOT
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Page size in characters; overrides TOKEN_LIMIT
    #[arg(long)]
    page_size: Option<usize>,

    /// Per-command timeout in seconds, 0 to disable
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load_or_default()?,
        };
        config.apply_env_overrides();

        if let Some(root) = self.repo_root {
            config.repository.root = root;
        }
        if let Some(page_size) = self.page_size {
            config.pagination.page_size = page_size;
        }
        if let Some(secs) = self.timeout_secs {
            config.commands.timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP transport, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Cli::parse().into_config()?;

    HgMcpServer::serve_stdio(config).await?;

    Ok(())
}
