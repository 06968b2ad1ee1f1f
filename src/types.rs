//! MCP request types and the paged response every tool returns

use crate::error::ValidationError;
use crate::pagination::LineWindow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One page of command output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Page {
    /// Text of this page
    pub content: String,
    /// Page number that was requested (1-based)
    pub page_number: usize,
    /// Number of characters in `content`
    pub character_count: usize,
    /// Whether a following page has content
    pub has_more: bool,
}

impl Page {
    pub fn new(content: String, page_number: usize, has_more: bool) -> Self {
        let character_count = content.chars().count();
        Self {
            content,
            page_number,
            character_count,
            has_more,
        }
    }

    pub fn empty(page_number: usize) -> Self {
        Self::new(String::new(), page_number, false)
    }
}

fn default_page() -> usize {
    1
}

pub(crate) fn validate_page(page: usize) -> Result<(), ValidationError> {
    if page == 0 {
        return Err(ValidationError::ConstraintViolation {
            field: "page".to_string(),
            constraint: "at least 1".to_string(),
            actual: page.to_string(),
        });
    }
    Ok(())
}

fn validate_not_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    Ok(())
}

/// Request for a file's content at a commit
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileAtCommitRequest {
    /// The hash of the commit
    pub commit_hash: String,
    /// Absolute path of the file (relative paths are taken from the repository root)
    pub file_path: String,
    /// Page number of the file content (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
}

impl FileAtCommitRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_not_empty("commit_hash", &self.commit_hash)
            .and_then(|_| validate_not_empty("file_path", &self.file_path))
            .and_then(|_| validate_page(self.page))
            .map_err(|e| e.to_string())
    }
}

/// Request to blame/annotate a file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BlameRequest {
    /// Absolute path of the file (relative paths are taken from the repository root)
    pub file_path: String,
    /// Page number of the blame output (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
    /// Keep only the first N lines before paginating
    #[serde(default)]
    pub head: Option<usize>,
    /// Keep only the last N lines before paginating
    #[serde(default)]
    pub tail: Option<usize>,
}

impl BlameRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_not_empty("file_path", &self.file_path)
            .and_then(|_| validate_page(self.page))
            .and_then(|_| LineWindow::new(self.head, self.tail).map(|_| ()))
            .map_err(|e| e.to_string())
    }
}

/// Request for the commit log, optionally for one file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogRequest {
    /// Restrict the log to this file, following renames
    #[serde(default)]
    pub file_path: Option<String>,
    /// Page number of the log (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
    /// Keep only the first N lines before paginating
    #[serde(default)]
    pub head: Option<usize>,
    /// Keep only the last N lines before paginating
    #[serde(default)]
    pub tail: Option<usize>,
}

impl LogRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.file_path {
            validate_not_empty("file_path", path).map_err(|e| e.to_string())?;
        }
        validate_page(self.page)
            .and_then(|_| LineWindow::new(self.head, self.tail).map(|_| ()))
            .map_err(|e| e.to_string())
    }
}

/// Request for a commit's description and diff
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommitSummaryRequest {
    /// The hash of the commit
    pub commit_hash: String,
    /// Page number of the summary (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
}

impl CommitSummaryRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_not_empty("commit_hash", &self.commit_hash)
            .and_then(|_| validate_page(self.page))
            .map_err(|e| e.to_string())
    }
}

/// Request to grep across all revisions
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
    /// The regex to search for
    pub pattern: String,
    /// Page number of the search results (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
    /// Keep only the first N lines before paginating
    #[serde(default)]
    pub head: Option<usize>,
    /// Keep only the last N lines before paginating
    #[serde(default)]
    pub tail: Option<usize>,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.pattern.is_empty() {
            return Err(ValidationError::Empty("pattern".to_string()).to_string());
        }
        validate_page(self.page)
            .and_then(|_| LineWindow::new(self.head, self.tail).map(|_| ()))
            .map_err(|e| e.to_string())
    }
}

/// Request for a Phabricator revision (differential)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RevisionRequest {
    /// The id of the revision; starts with 'D' (e.g. "D1234")
    pub revision_id: String,
    /// Page number (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
}

impl RevisionRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_page(self.page).map_err(|e| e.to_string())
    }
}

/// Request for a Phabricator task (maniphest)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskRequest {
    /// The id of the task; starts with 'T' (e.g. "T567")
    pub task_id: String,
    /// Page number (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
}

impl TaskRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_page(self.page).map_err(|e| e.to_string())
    }
}
