/// Platform-specific config location and lexical path resolution
///
/// Caller-supplied file paths are turned into paths relative to the directory
/// the external tools run in, independent of the server's own working directory.
use std::path::{Component, Path, PathBuf};

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get default project-specific config directory
    ///
    /// Returns: {config_dir}/hg-mcp
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join("hg-mcp")
    }

    /// Get default config file path
    ///
    /// Returns: {config_dir}/hg-mcp/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}

/// Remove `.` and resolve `..` components without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Express `path` relative to `base`, walking up with `..` where needed.
///
/// Both paths are normalized lexically first. Returns `.` when they are equal.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize_lexically(path);
    let base = normalize_lexically(base);

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        rel
    }
}

/// Resolve a caller-supplied file path for an `hg` invocation.
///
/// Absolute paths are taken as-is, relative ones are anchored at the
/// repository root. The result is relative to `working_dir`.
pub fn resolve_repo_path(file_path: &str, repo_root: &Path, working_dir: &Path) -> PathBuf {
    let candidate = Path::new(file_path);
    let absolute = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        repo_root.join(candidate)
    };
    relative_to(&absolute, working_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let path = PlatformPaths::default_config_path();
        let s = path.to_string_lossy();
        assert!(s.contains("hg-mcp"));
        assert!(s.ends_with("config.toml"));
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_lexically(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_lexically(Path::new("a/b/../../..")), PathBuf::from(".."));
    }

    #[test]
    fn test_relative_to_descendant() {
        let rel = relative_to(
            Path::new("/home/dev/repo/devel/api.py"),
            Path::new("/home/dev"),
        );
        assert_eq!(rel, PathBuf::from("repo/devel/api.py"));
    }

    #[test]
    fn test_relative_to_sibling() {
        let rel = relative_to(Path::new("/home/other/file.txt"), Path::new("/home/dev"));
        assert_eq!(rel, PathBuf::from("../other/file.txt"));
    }

    #[test]
    fn test_relative_to_same_path() {
        assert_eq!(
            relative_to(Path::new("/home/dev/"), Path::new("/home/dev")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_relative_to_filesystem_root() {
        assert_eq!(
            relative_to(Path::new("/repo/a.txt"), Path::new("/")),
            PathBuf::from("repo/a.txt")
        );
    }

    #[test]
    fn test_resolve_repo_path_absolute() {
        let rel = resolve_repo_path(
            "/home/dev/repo/events/api.py",
            Path::new("/home/dev/repo"),
            Path::new("/home/dev"),
        );
        assert_eq!(rel, PathBuf::from("repo/events/api.py"));
    }

    #[test]
    fn test_resolve_repo_path_relative_is_anchored_at_root() {
        let rel = resolve_repo_path(
            "events/../events/api.py",
            Path::new("/home/dev/repo"),
            Path::new("/home/dev"),
        );
        assert_eq!(rel, PathBuf::from("repo/events/api.py"));
    }
}
