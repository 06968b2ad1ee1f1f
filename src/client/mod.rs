//! Core library client for hg-mcp
//!
//! This module provides the query operations behind every MCP tool. Each one
//! builds its command(s), runs them through a [`CommandRunner`] and returns
//! a single [`Page`] of the combined output.

pub mod commands;

use crate::config::Config;
use crate::error::{HgMcpError, ValidationError};
use crate::pagination::{LineWindow, paginate};
use crate::paths::resolve_repo_path;
use crate::runner::{CommandRunner, CommandSpec, ProcessRunner};
use crate::types::{Page, validate_page};
use commands::{
    CommandBuilder, REVISION_SEARCH_METHOD, TASK_SEARCH_METHOD, parse_revision_id, parse_task_id,
    validate_commit,
};
use std::sync::Arc;

/// Main client for repository introspection
///
/// Holds the immutable process-wide configuration and the runner used for
/// every external command. Cheap to clone.
///
/// # Example
///
/// ```no_run
/// use hg_mcp::client::HgClient;
/// use hg_mcp::config::Config;
///
/// # async fn example() -> Result<(), hg_mcp::error::HgMcpError> {
/// let client = HgClient::new(Config::for_repository("/home/dev/repo"))?;
/// let page = client.log_commits(None, 1, Default::default()).await?;
/// println!("{}", page.content);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HgClient {
    config: Arc<Config>,
    runner: Arc<dyn CommandRunner>,
}

impl HgClient {
    /// Create a client that spawns real processes; validates the configuration first
    pub fn new(config: Config) -> Result<Self, HgMcpError> {
        config.validate()?;
        let runner = ProcessRunner::new(config.commands.timeout());
        Ok(Self::with_runner(config, Arc::new(runner)))
    }

    /// Create a client with a custom runner. The configuration is used as-is.
    pub fn with_runner(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn commands(&self) -> CommandBuilder<'_> {
        CommandBuilder::new(&self.config.commands)
    }

    fn resolve(&self, file_path: &str) -> Result<String, ValidationError> {
        if file_path.trim().is_empty() {
            return Err(ValidationError::Empty("file_path".to_string()));
        }
        let relpath = resolve_repo_path(
            file_path,
            &self.config.repository.root,
            self.config.working_dir(),
        );
        Ok(relpath.to_string_lossy().into_owned())
    }

    async fn run(&self, command: &CommandSpec) -> Result<String, HgMcpError> {
        Ok(self
            .runner
            .execute(command, self.config.working_dir())
            .await?)
    }

    fn page(&self, text: &str, page: usize) -> Page {
        paginate(text, page, self.config.pagination.page_size)
    }

    /// Content of a file at a specific commit
    pub async fn get_file_at_commit(
        &self,
        commit_hash: &str,
        file_path: &str,
        page: usize,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        let commit = validate_commit(commit_hash)?;
        let relpath = self.resolve(file_path)?;

        let output = self.run(&self.commands().cat(commit, &relpath)).await?;
        Ok(self.page(&output, page))
    }

    /// Per-line `hash, parent_hash, author, age, content` annotation of a file
    pub async fn blame_file(
        &self,
        file_path: &str,
        page: usize,
        window: LineWindow,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        let relpath = self.resolve(file_path)?;

        let output = self.run(&self.commands().annotate(&relpath)).await?;
        Ok(self.page(&window.apply(&output), page))
    }

    /// Commit log, optionally restricted to one file (following renames)
    pub async fn log_commits(
        &self,
        file_path: Option<&str>,
        page: usize,
        window: LineWindow,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        let relpath = file_path.map(|path| self.resolve(path)).transpose()?;

        let output = self.run(&self.commands().log(relpath.as_deref())).await?;
        Ok(self.page(&window.apply(&output), page))
    }

    /// Description and diff of one commit, fetched concurrently
    pub async fn get_commit_summary(
        &self,
        commit_hash: &str,
        page: usize,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        let commit = validate_commit(commit_hash)?;
        let commands = self.commands();
        let desc_command = commands.commit_description(commit);
        let diff_command = commands.commit_diff(commit);

        let (desc, diff) = tokio::try_join!(self.run(&desc_command), self.run(&diff_command))?;

        let summary = format!("Description:\n{desc}\n\nDiff:\n{diff}");
        Ok(self.page(&summary, page))
    }

    /// Regex search across every revision of every tracked file
    pub async fn search_across_files(
        &self,
        pattern: &str,
        page: usize,
        window: LineWindow,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        if pattern.is_empty() {
            return Err(ValidationError::Empty("pattern".to_string()).into());
        }

        let output = self.run(&self.commands().grep(pattern)).await?;
        Ok(self.page(&window.apply(&output), page))
    }

    /// Title, summary, test plan and other metadata of a revision (no code)
    pub async fn get_revision_summary_by_id(
        &self,
        revision_id: &str,
        page: usize,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        let id = parse_revision_id(revision_id)?;

        let command = self.commands().conduit_search(REVISION_SEARCH_METHOD, id);
        let output = self.run(&command).await?;
        Ok(self.page(&output, page))
    }

    /// Code changes of a revision as a git-style patch
    pub async fn get_revision_changes_by_id(
        &self,
        revision_id: &str,
        page: usize,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        let id = parse_revision_id(revision_id)?;

        let output = self.run(&self.commands().export_revision(id)).await?;
        Ok(self.page(&output, page))
    }

    /// Title, description and other metadata of a task
    pub async fn get_task_summary_by_id(
        &self,
        task_id: &str,
        page: usize,
    ) -> Result<Page, HgMcpError> {
        validate_page(page)?;
        let id = parse_task_id(task_id)?;

        let command = self.commands().conduit_search(TASK_SEARCH_METHOD, id);
        let output = self.run(&command).await?;
        Ok(self.page(&output, page))
    }
}
