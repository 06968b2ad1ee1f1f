/// Configuration system for hg-mcp
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, HgMcpError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Repository location
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Pagination budget
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// External binaries and their limits
    #[serde(default)]
    pub commands: CommandConfig,
}

/// Repository configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepositoryConfig {
    /// Root of the Mercurial repository. Commands run in its parent directory.
    #[serde(default)]
    pub root: PathBuf,
}

/// Pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Maximum characters accumulated into one page (soft ceiling)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// External command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Mercurial binary
    #[serde(default = "default_hg_binary")]
    pub hg_binary: String,

    /// Arcanist binary used for Phabricator queries
    #[serde(default = "default_arc_binary")]
    pub arc_binary: String,

    /// Per-invocation timeout in seconds; 0 disables the timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_page_size() -> usize {
    4096
}

fn default_hg_binary() -> String {
    "hg".to_string()
}

fn default_arc_binary() -> String {
    "arc".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            hg_binary: default_hg_binary(),
            arc_binary: default_arc_binary(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CommandConfig {
    /// Timeout as a duration, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    /// Create a config for a repository root with every other value defaulted
    pub fn for_repository(root: impl Into<PathBuf>) -> Self {
        Self {
            repository: RepositoryConfig { root: root.into() },
            ..Self::default()
        }
    }

    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, HgMcpError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, HgMcpError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), HgMcpError> {
        let root = &self.repository.root;
        if root.as_os_str().is_empty() {
            return Err(
                ConfigError::MissingRequired("repository.root (HG_REPO_ROOT)".to_string()).into(),
            );
        }

        if !root.is_dir() {
            return Err(ConfigError::InvalidValue {
                key: "repository.root".to_string(),
                reason: format!("'{}' does not exist or is not a directory", root.display()),
            }
            .into());
        }

        if self.pagination.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pagination.page_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        for (key, binary) in [
            ("commands.hg_binary", &self.commands.hg_binary),
            ("commands.arc_binary", &self.commands.arc_binary),
        ] {
            if binary.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("HG_REPO_ROOT") {
            self.repository.root = PathBuf::from(root);
        }

        if let Ok(limit) = std::env::var("TOKEN_LIMIT")
            && let Ok(size) = limit.parse()
        {
            self.pagination.page_size = size;
        }

        if let Ok(hg) = std::env::var("HG_MCP_HG_BIN") {
            self.commands.hg_binary = hg;
        }

        if let Ok(arc) = std::env::var("HG_MCP_ARC_BIN") {
            self.commands.arc_binary = arc;
        }

        if let Ok(timeout) = std::env::var("HG_MCP_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse()
        {
            self.commands.timeout_secs = secs;
        }
    }

    /// Directory the external tools run in: the parent of the repository root
    pub fn working_dir(&self) -> &Path {
        let root = self.repository.root.as_path();
        match root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => root,
        }
    }

    /// Create a new Config from the default file location and environment
    pub fn new() -> Result<Self, HgMcpError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
