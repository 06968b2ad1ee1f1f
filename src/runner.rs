//! External process execution
//!
//! Commands are always built as a program plus a discrete argument vector;
//! nothing is ever handed to a shell.

use crate::error::ExternalCommandError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A command to run: program, arguments and an optional stdin payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Payload written to the child's stdin, which is then closed
    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Human-readable command line, for logs and error context only
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Raw outcome of one process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub succeeded: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// Turn the raw outcome into trimmed stdout or the trimmed stderr failure
    pub fn into_output(self, command: &CommandSpec) -> Result<String, ExternalCommandError> {
        if self.succeeded {
            Ok(self.stdout.trim_end().to_string())
        } else {
            Err(ExternalCommandError::Failed {
                command: command.display(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Trait for running external commands
///
/// Implementations must allow concurrent calls; there is no shared mutable
/// state between invocations.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` in `working_dir` and return its trimmed stdout
    async fn execute(
        &self,
        command: &CommandSpec,
        working_dir: &Path,
    ) -> Result<String, ExternalCommandError>;
}

/// Runs commands as child processes via `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Create a runner; `None` waits for the child indefinitely
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    async fn run(
        &self,
        command: &CommandSpec,
        working_dir: &Path,
    ) -> std::io::Result<CommandResult> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(working_dir)
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feed stdin while the output is drained, so a child that stops
        // reading can neither block the write nor hide its own diagnostic
        let stdin = child.stdin.take();
        let feed = async move {
            match (&command.stdin, stdin) {
                (Some(payload), Some(mut stdin)) => {
                    match stdin.write_all(payload.as_bytes()).await {
                        Ok(()) => stdin.shutdown().await,
                        Err(e) => Err(e),
                    }
                }
                _ => std::io::Result::Ok(()),
            }
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        match fed {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                tracing::debug!("`{}` closed stdin early", command.display());
            }
            // A failed exit is reported through its stderr instead
            Err(e) if output.status.success() => return Err(e),
            _ => {}
        }

        Ok(CommandResult {
            succeeded: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn execute(
        &self,
        command: &CommandSpec,
        working_dir: &Path,
    ) -> Result<String, ExternalCommandError> {
        tracing::debug!(
            "Running `{}` in {}",
            command.display(),
            working_dir.display()
        );

        let launch_failed = |e: std::io::Error| ExternalCommandError::Launch {
            command: command.display(),
            message: e.to_string(),
        };

        // The child is killed on drop if the timeout fires first
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(command, working_dir))
                .await
                .map_err(|_| ExternalCommandError::TimedOut {
                    command: command.display(),
                    timeout: limit,
                })?
                .map_err(launch_failed)?,
            None => self
                .run(command, working_dir)
                .await
                .map_err(launch_failed)?,
        };

        let output = result.into_output(command);
        if let Err(e) = &output {
            tracing::warn!("Command `{}` failed: {}", e.command(), e);
        }
        output
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("hg").args(["grep", "--all", "--", "foo bar"]);
        assert_eq!(spec.display(), "hg grep --all -- foo bar");
        assert_eq!(spec.args.len(), 4);
        assert_eq!(CommandSpec::new("hg").display(), "hg");
    }

    #[test]
    fn test_into_output_trims_trailing_whitespace_only() {
        let spec = CommandSpec::new("hg");
        let result = CommandResult {
            succeeded: true,
            code: Some(0),
            stdout: "  indented\nline\n\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(result.into_output(&spec).unwrap(), "  indented\nline");
    }

    #[test]
    fn test_into_output_failure_uses_trimmed_stderr() {
        let spec = CommandSpec::new("hg").arg("log");
        let result = CommandResult {
            succeeded: false,
            code: Some(255),
            stdout: "ignored".to_string(),
            stderr: "\nabort: no repository found\n".to_string(),
        };
        let err = result.into_output(&spec).unwrap_err();
        assert_eq!(err.to_string(), "abort: no repository found");
        assert_eq!(err.command(), "hg log");
    }

    #[tokio::test]
    async fn test_execute_success() {
        let runner = ProcessRunner::default();
        let out = runner
            .execute(&sh("printf 'hello\\n\\n'"), Path::new("."))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_execute_runs_in_working_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ProcessRunner::default();
        let out = runner.execute(&sh("pwd"), dir.path()).await.unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(&out).canonicalize().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_execute_non_zero_exit() {
        let runner = ProcessRunner::default();
        let err = runner
            .execute(&sh("echo '  boom  ' >&2; exit 3"), Path::new("."))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(matches!(err, ExternalCommandError::Failed { code: Some(3), .. }));
    }

    #[tokio::test]
    async fn test_execute_missing_binary_is_same_error_kind() {
        let runner = ProcessRunner::default();
        let err = runner
            .execute(
                &CommandSpec::new("definitely-not-a-real-binary-4821"),
                Path::new("."),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExternalCommandError::Launch { .. }));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_execute_writes_stdin() {
        let runner = ProcessRunner::default();
        let spec = CommandSpec::new("cat").stdin(r#"{"constraints": {"ids": [42]}}"#);
        let out = runner.execute(&spec, Path::new(".")).await.unwrap();
        assert_eq!(out, r#"{"constraints": {"ids": [42]}}"#);
    }

    #[tokio::test]
    async fn test_execute_does_not_interpret_shell_syntax() {
        let runner = ProcessRunner::default();
        let spec = CommandSpec::new("echo").arg("$(whoami); rm -rf /tmp/x");
        let out = runner.execute(&spec, Path::new(".")).await.unwrap();
        assert_eq!(out, "$(whoami); rm -rf /tmp/x");
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)));
        let err = runner
            .execute(&sh("sleep 5"), Path::new("."))
            .await
            .unwrap_err();
        assert!(matches!(err, ExternalCommandError::TimedOut { .. }));
        assert_eq!(err.to_string(), "`sh -c sleep 5` timed out after 200ms");
    }

    #[tokio::test]
    async fn test_child_closing_stdin_keeps_its_diagnostic() {
        let runner = ProcessRunner::default();
        let payload = "x".repeat(4 * 1024 * 1024);
        let spec = sh("exec 0<&-; echo 'conduit unreachable' >&2; exit 2").stdin(payload);

        let err = runner.execute(&spec, Path::new(".")).await.unwrap_err();

        assert_eq!(err.to_string(), "conduit unreachable");
        assert!(matches!(err, ExternalCommandError::Failed { code: Some(2), .. }));
    }

    #[tokio::test]
    async fn test_small_payload_to_child_ignoring_stdin() {
        let runner = ProcessRunner::default();
        let spec = sh("exec 0<&-; echo 'ERR-DIAG' >&2; exit 2")
            .stdin(r#"{"constraints": {"ids": [1234]}}"#);

        for _ in 0..20 {
            let err = runner.execute(&spec, Path::new(".")).await.unwrap_err();
            assert_eq!(err.to_string(), "ERR-DIAG");
        }
    }

    #[tokio::test]
    async fn test_payload_larger_than_pipe_buffer_is_echoed() {
        let runner = ProcessRunner::new(Some(Duration::from_secs(30)));
        let payload: String = (0..100_000).map(|i| format!("{i}\n")).collect();
        let spec = CommandSpec::new("cat").stdin(payload.clone());

        let out = runner.execute(&spec, Path::new(".")).await.unwrap();

        assert_eq!(out, payload.trim_end());
    }

    #[tokio::test]
    async fn test_concurrent_executions_overlap() {
        let runner = ProcessRunner::default();
        let start = std::time::Instant::now();
        let first = sh("sleep 0.5; echo a");
        let second = sh("sleep 0.5; echo b");
        let (a, b) = tokio::join!(
            runner.execute(&first, Path::new(".")),
            runner.execute(&second, Path::new("."))
        );
        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");
        assert!(start.elapsed() < Duration::from_millis(950));
    }
}
