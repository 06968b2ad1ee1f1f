use crate::client::HgClient;
use crate::config::Config;
use crate::error::HgMcpError;
use crate::pagination::LineWindow;
use crate::types::*;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::prompt::PromptRouter, tool::ToolRouter, wrapper::Parameters},
    model::*,
    prompt, prompt_handler, prompt_router,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct HgMcpServer {
    client: Arc<HgClient>,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl HgMcpServer {
    /// Create a new server; fails if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        let client = HgClient::new(config)?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Create a new server with an existing client
    pub fn with_client(client: Arc<HgClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    /// Get the underlying client
    pub fn client(&self) -> &HgClient {
        &self.client
    }
}

/// Serialize a page, or hand back the error's message as the tool failure
fn render(result: Result<Page, HgMcpError>) -> Result<String, String> {
    let page = result.map_err(|e| {
        tracing::warn!("Tool call failed: {}", e);
        e.to_user_string()
    })?;
    serde_json::to_string_pretty(&page).map_err(|e| format!("Serialization failed: {}", e))
}

fn line_window(head: Option<usize>, tail: Option<usize>) -> Result<LineWindow, String> {
    LineWindow::new(head, tail).map_err(|e| e.to_string())
}

#[tool_router(router = tool_router)]
impl HgMcpServer {
    #[tool(
        description = "Get the content of a file at a specific commit. Returns one page of the file plus pagination metadata (page_number, character_count, has_more)."
    )]
    async fn get_file_at_commit(
        &self,
        Parameters(req): Parameters<FileAtCommitRequest>,
    ) -> Result<String, String> {
        req.validate()?;

        render(
            self.client
                .get_file_at_commit(&req.commit_hash, &req.file_path, req.page)
                .await,
        )
    }

    #[tool(
        description = "Blame/annotate a file. Each line has the form: <commit_hash>, <parent_commit_hash>, <author>, <age>, <line_content>."
    )]
    async fn blame_file(
        &self,
        Parameters(req): Parameters<BlameRequest>,
    ) -> Result<String, String> {
        req.validate()?;
        let window = line_window(req.head, req.tail)?;

        render(self.client.blame_file(&req.file_path, req.page, window).await)
    }

    #[tool(
        description = "Get the commit log. If file_path is provided, returns the log of commits for that file, following renames."
    )]
    async fn log_commits(&self, Parameters(req): Parameters<LogRequest>) -> Result<String, String> {
        req.validate()?;
        let window = line_window(req.head, req.tail)?;

        render(
            self.client
                .log_commits(req.file_path.as_deref(), req.page, window)
                .await,
        )
    }

    #[tool(description = "Get the summary of a commit: its description followed by its diff.")]
    async fn get_commit_summary(
        &self,
        Parameters(req): Parameters<CommitSummaryRequest>,
    ) -> Result<String, String> {
        req.validate()?;

        render(
            self.client
                .get_commit_summary(&req.commit_hash, req.page)
                .await,
        )
    }

    #[tool(
        description = "Search for a regex across all revisions of all files in the repository. Results include the revision each match belongs to. Can be slow on large repositories, so use when necessary."
    )]
    async fn search_across_files(
        &self,
        Parameters(req): Parameters<SearchRequest>,
    ) -> Result<String, String> {
        req.validate()?;
        let window = line_window(req.head, req.tail)?;

        render(
            self.client
                .search_across_files(&req.pattern, req.page, window)
                .await,
        )
    }

    #[tool(
        description = "Get the summary of a revision/differential (code changes not yet committed): title, description, test plan and other metadata, without the code changes. The id starts with 'D'."
    )]
    async fn get_revision_summary_by_id(
        &self,
        Parameters(req): Parameters<RevisionRequest>,
    ) -> Result<String, String> {
        req.validate()?;

        render(
            self.client
                .get_revision_summary_by_id(&req.revision_id, req.page)
                .await,
        )
    }

    #[tool(
        description = "Get the code changes of a revision/differential as a git-style patch. The id starts with 'D'."
    )]
    async fn get_revision_changes_by_id(
        &self,
        Parameters(req): Parameters<RevisionRequest>,
    ) -> Result<String, String> {
        req.validate()?;

        render(
            self.client
                .get_revision_changes_by_id(&req.revision_id, req.page)
                .await,
        )
    }

    #[tool(
        description = "Get the summary of a task/maniphest (bugs, feature requests and other unresolved work): title, description and other metadata. The id starts with 'T'."
    )]
    async fn get_task_summary_by_id(
        &self,
        Parameters(req): Parameters<TaskRequest>,
    ) -> Result<String, String> {
        req.validate()?;

        render(
            self.client
                .get_task_summary_by_id(&req.task_id, req.page)
                .await,
        )
    }
}

// Prompts for slash commands
#[prompt_router]
impl HgMcpServer {
    #[prompt(
        name = "summarize-commit",
        description = "Summarize what a commit changes and why"
    )]
    async fn summarize_commit_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let commit = args.get("commit").and_then(|v| v.as_str()).unwrap_or("tip");

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Use get_commit_summary for commit {} (request further pages while has_more is true) and summarize what changed and why.",
                commit
            ),
        )])
    }

    #[prompt(
        name = "explain-file-history",
        description = "Explain how a file evolved using its log and blame"
    )]
    async fn explain_file_history_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Explain the history of '{}'. Start with log_commits for the file, then use blame_file and get_commit_summary on the commits that matter.",
                path
            ),
        )])
    }

    #[prompt(
        name = "review-revision",
        description = "Review a Phabricator revision from its summary and changes"
    )]
    async fn review_revision_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let revision = args.get("revision").and_then(|v| v.as_str()).unwrap_or("");

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Review revision {}. Read get_revision_summary_by_id first, then every page of get_revision_changes_by_id.",
                revision
            ),
        )])
    }
}

#[tool_handler(router = self.tool_router)]
#[prompt_handler]
impl ServerHandler for HgMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "hg-mcp".into(),
                title: Some("Mercurial MCP - read-only repository introspection".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only access to a Mercurial repository and its Phabricator tracker. \
                Every tool returns one page of output; request page + 1 while has_more is true."
                    .into(),
            ),
        }
    }
}

impl HgMcpServer {
    pub async fn serve_stdio(config: Config) -> Result<()> {
        tracing::info!(
            "Starting hg MCP server for {}",
            config.repository.root.display()
        );

        let server = Self::new(config).context("Failed to create MCP server")?;

        let transport = rmcp::transport::io::stdio();

        server.serve(transport).await?.waiting().await?;

        Ok(())
    }
}
