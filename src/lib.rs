//! # hg-mcp - Mercurial Introspection over MCP
//!
//! A Rust-based Model Context Protocol (MCP) server that gives AI assistants
//! read-only access to a Mercurial repository and its Phabricator tracker.
//!
//! ## Overview
//!
//! Every tool shells out to `hg` or `arc` (as a plain argument vector, never
//! through a shell) and returns one bounded page of the output. Pages are cut
//! on a character budget at line/token boundaries, so a caller can walk any
//! output page by page and reassemble it exactly.
//!
//! ## Tools
//!
//! - `get_file_at_commit`, `blame_file`, `log_commits`, `get_commit_summary`,
//!   `search_across_files` (Mercurial)
//! - `get_revision_summary_by_id`, `get_revision_changes_by_id`,
//!   `get_task_summary_by_id` (Phabricator via `arc`)
//!
//! ## Architecture
//!
//! ```text
//! MCP client --stdio--> HgMcpServer --> HgClient --> CommandRunner (hg / arc)
//!                                          |
//!                                          +--> paginate() --> Page
//! ```
//!
//! ## Modules
//!
//! - [`mcp_server`]: MCP protocol server with tools and prompts
//! - [`client`]: query operations and command construction
//! - [`runner`]: async external process execution
//! - [`pagination`]: character-budget paging and head/tail line windows
//! - [`config`]: configuration with file and environment variable support
//! - [`types`]: MCP request types and the `Page` response
//! - [`error`]: error types
//! - [`paths`]: config location and path resolution
//!
//! ## Usage Example
//!
//! ```no_run
//! use hg_mcp::config::Config;
//! use hg_mcp::mcp_server::HgMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new()?;
//!
//!     // Serve over stdio (MCP protocol)
//!     HgMcpServer::serve_stdio(config).await?;
//!
//!     Ok(())
//! }
//! ```

/// Query operations over the repository and tracker
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// MCP server implementation with tools and prompts
pub mod mcp_server;

/// Character-budget pagination of command output
pub mod pagination;

/// Path resolution and platform config location
pub mod paths;

/// External command execution
pub mod runner;

/// MCP request/response types with JSON schema definitions
pub mod types;

#[cfg(test)]
mod test_support;
