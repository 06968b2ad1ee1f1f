//! Argument-vector construction for `hg` and `arc`, plus identifier checks
//! that must pass before anything is spawned.

use crate::config::CommandConfig;
use crate::error::ValidationError;
use crate::runner::CommandSpec;
use regex::Regex;
use std::sync::LazyLock;

/// `hg annotate` template producing `hash, parent_hash, author, age, content` lines
pub const BLAME_TEMPLATE: &str = r#"{lines % "{pad(node|short,12,left=true)}, {pad(p1node|short,12,left=true)}, {pad(fill(author|emailuser|lower,11)|firstline,11,left=true)}, {pad(date|age|short,13,left=true)}, {line}"}"#;

/// Conduit method for revision metadata
pub const REVISION_SEARCH_METHOD: &str = "differential.revision.search";

/// Conduit method for task metadata
pub const TASK_SEARCH_METHOD: &str = "maniphest.search";

/// Marker for revision ids, e.g. `D1234`
pub const REVISION_MARKER: char = 'D';

/// Marker for task ids, e.g. `T567`
pub const TASK_MARKER: char = 'T';

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Parse a marker-prefixed Phabricator id into its numeric part
pub fn parse_prefixed_id(
    raw: &str,
    kind: &'static str,
    marker: char,
) -> Result<u64, ValidationError> {
    let raw = raw.trim();
    let Some(number) = raw.strip_prefix(marker) else {
        return Err(ValidationError::MissingPrefix { kind, marker });
    };

    let invalid = || ValidationError::InvalidIdentifier {
        kind,
        marker,
        actual: raw.to_string(),
    };

    if !DIGITS.is_match(number) {
        return Err(invalid());
    }
    number.parse().map_err(|_| invalid())
}

pub fn parse_revision_id(raw: &str) -> Result<u64, ValidationError> {
    parse_prefixed_id(raw, "Revision", REVISION_MARKER)
}

pub fn parse_task_id(raw: &str) -> Result<u64, ValidationError> {
    parse_prefixed_id(raw, "Task", TASK_MARKER)
}

/// Commit ids go into argv as a single argument, but must not look like an option
pub fn validate_commit(commit: &str) -> Result<&str, ValidationError> {
    let commit = commit.trim();
    if commit.is_empty() {
        return Err(ValidationError::Empty("commit_hash".to_string()));
    }
    if commit.starts_with('-') {
        return Err(ValidationError::InvalidCommit(commit.to_string()));
    }
    Ok(commit)
}

/// Builds every command the query operations need
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    config: &'a CommandConfig,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a CommandConfig) -> Self {
        Self { config }
    }

    fn hg(&self) -> CommandSpec {
        CommandSpec::new(&self.config.hg_binary)
    }

    fn arc(&self) -> CommandSpec {
        CommandSpec::new(&self.config.arc_binary)
    }

    pub fn cat(&self, commit: &str, relpath: &str) -> CommandSpec {
        self.hg().args(["cat", "-r", commit, relpath])
    }

    pub fn annotate(&self, relpath: &str) -> CommandSpec {
        self.hg().args(["annotate", "--template", BLAME_TEMPLATE, relpath])
    }

    /// `-f` follows the file across copies and renames
    pub fn log(&self, relpath: Option<&str>) -> CommandSpec {
        let spec = self.hg().arg("log");
        match relpath {
            Some(path) => spec.args(["-f", path]),
            None => spec,
        }
    }

    pub fn commit_description(&self, commit: &str) -> CommandSpec {
        self.hg().args(["log", "-r", commit, "--template", "{desc}"])
    }

    /// The change introduced by `commit`, against its first parent
    pub fn commit_diff(&self, commit: &str) -> CommandSpec {
        self.hg().args(["diff", "-c", commit])
    }

    pub fn grep(&self, pattern: &str) -> CommandSpec {
        self.hg().args(["grep", "--all", "--", pattern])
    }

    /// `arc call-conduit` with a `{"constraints": {"ids": [id]}}` request on stdin
    pub fn conduit_search(&self, method: &str, id: u64) -> CommandSpec {
        let request = serde_json::json!({ "constraints": { "ids": [id] } });
        self.arc()
            .args(["call-conduit", "--", method])
            .stdin(request.to_string())
    }

    pub fn export_revision(&self, revision_id: u64) -> CommandSpec {
        self.arc().args([
            "export".to_string(),
            "--revision".to_string(),
            format!("{REVISION_MARKER}{revision_id}"),
            "--git".to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_revision_id() {
        assert_eq!(parse_revision_id("D1234").unwrap(), 1234);
        assert_eq!(parse_revision_id(" D7 ").unwrap(), 7);
    }

    #[test]
    fn test_parse_revision_id_missing_prefix() {
        let err = parse_revision_id("1234").unwrap_err();
        assert_eq!(err.to_string(), "Revision id must start with 'D'");
        assert!(matches!(
            parse_revision_id("T1234"),
            Err(ValidationError::MissingPrefix { marker: 'D', .. })
        ));
    }

    #[test]
    fn test_parse_revision_id_rejects_non_digits() {
        for raw in ["D", "D12a", "D-1", "D1 2", "D1]}, \"x\": [1"] {
            assert!(
                matches!(
                    parse_revision_id(raw),
                    Err(ValidationError::InvalidIdentifier { .. })
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_revision_id_overflow() {
        assert!(parse_revision_id("D99999999999999999999999").is_err());
    }

    #[test]
    fn test_parse_task_id() {
        assert_eq!(parse_task_id("T567").unwrap(), 567);
        assert_eq!(
            parse_task_id("D567").unwrap_err().to_string(),
            "Task id must start with 'T'"
        );
    }

    #[test]
    fn test_validate_commit() {
        assert_eq!(validate_commit(" 22383e014ee8 ").unwrap(), "22383e014ee8");
        assert_eq!(validate_commit("tip").unwrap(), "tip");
        assert!(matches!(
            validate_commit("--config=hooks.pre-cat=evil"),
            Err(ValidationError::InvalidCommit(_))
        ));
        assert!(matches!(validate_commit(""), Err(ValidationError::Empty(_))));
    }

    #[test]
    fn test_cat_command() {
        let config = CommandConfig::default();
        let spec = CommandBuilder::new(&config).cat("22383e014ee8", "repo/events/api.py");
        assert_eq!(spec.program, "hg");
        assert_eq!(spec.args, ["cat", "-r", "22383e014ee8", "repo/events/api.py"]);
        assert!(spec.stdin.is_none());
    }

    #[test]
    fn test_annotate_command_uses_template() {
        let config = CommandConfig::default();
        let spec = CommandBuilder::new(&config).annotate("repo/a.py");
        assert_eq!(spec.args[0], "annotate");
        assert_eq!(spec.args[1], "--template");
        assert!(spec.args[2].contains("p1node|short"));
        assert_eq!(spec.args[3], "repo/a.py");
    }

    #[test]
    fn test_log_command() {
        let config = CommandConfig::default();
        let builder = CommandBuilder::new(&config);
        assert_eq!(builder.log(None).args, ["log"]);
        assert_eq!(builder.log(Some("repo/a.py")).args, ["log", "-f", "repo/a.py"]);
    }

    #[test]
    fn test_grep_pattern_is_one_argument() {
        let config = CommandConfig::default();
        let spec = CommandBuilder::new(&config).grep("foo' ; rm -rf / ; '");
        assert_eq!(spec.args, ["grep", "--all", "--", "foo' ; rm -rf / ; '"]);
    }

    #[test]
    fn test_conduit_search_command() {
        let config = CommandConfig::default();
        let spec = CommandBuilder::new(&config).conduit_search(TASK_SEARCH_METHOD, 567);
        assert_eq!(spec.program, "arc");
        assert_eq!(spec.args, ["call-conduit", "--", "maniphest.search"]);

        let payload: serde_json::Value =
            serde_json::from_str(spec.stdin.as_deref().unwrap()).unwrap();
        assert_eq!(payload, serde_json::json!({ "constraints": { "ids": [567] } }));
    }

    #[test]
    fn test_export_revision_command() {
        let config = CommandConfig::default();
        let spec = CommandBuilder::new(&config).export_revision(1234);
        assert_eq!(spec.args, ["export", "--revision", "D1234", "--git"]);
    }

    #[test]
    fn test_custom_binaries() {
        let config = CommandConfig {
            hg_binary: "/opt/hg/bin/hg".to_string(),
            arc_binary: "/opt/arc/bin/arc".to_string(),
            timeout_secs: 0,
        };
        let builder = CommandBuilder::new(&config);
        assert_eq!(builder.commit_diff("abc").program, "/opt/hg/bin/hg");
        assert_eq!(builder.export_revision(1).program, "/opt/arc/bin/arc");
    }
}
