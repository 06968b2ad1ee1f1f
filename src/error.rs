/// Centralized error types for hg-mcp using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use std::time::Duration;
use thiserror::Error;

/// Main error type for hg-mcp
#[derive(Error, Debug)]
pub enum HgMcpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Surfaced verbatim: the message is the external tool's own diagnostic
    #[error(transparent)]
    Command(#[from] ExternalCommandError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Failure of an external `hg`/`arc` invocation.
///
/// Launch failures and non-zero exits are the same error kind; callers only
/// ever see the diagnostic text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalCommandError {
    #[error("{stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{message}")]
    Launch { command: String, message: String },

    #[error("`{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },
}

impl ExternalCommandError {
    /// The command line that failed, for logging
    pub fn command(&self) -> &str {
        match self {
            Self::Failed { command, .. }
            | Self::Launch { command, .. }
            | Self::TimedOut { command, .. } => command,
        }
    }
}

/// Errors related to input validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} id must start with '{marker}'")]
    MissingPrefix { kind: &'static str, marker: char },

    #[error("{kind} id must be '{marker}' followed by digits, got '{actual}'")]
    InvalidIdentifier {
        kind: &'static str,
        marker: char,
        actual: String,
    },

    #[error("Invalid commit id: {0}")]
    InvalidCommit(String),

    #[error("{field} must be {constraint}, got {actual}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        actual: String,
    },

    #[error("{0} and {1} cannot be used together")]
    ConflictingOptions(String, String),

    #[error("Empty {0}")]
    Empty(String),
}

impl HgMcpError {
    /// Convert to a user-facing error string suitable for MCP responses
    pub fn to_user_string(&self) -> String {
        format!("{}", self)
    }

    /// Check if this is a user error (bad input) vs a system/tool error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            HgMcpError::Validation(_) | HgMcpError::Config(ConfigError::InvalidValue { .. })
        )
    }
}
