//! Shared test doubles

use crate::error::ExternalCommandError;
use crate::runner::{CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&CommandSpec) -> Result<String, ExternalCommandError> + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub spec: CommandSpec,
    pub cwd: PathBuf,
}

/// Records every invocation and answers from a closure
#[derive(Clone)]
pub(crate) struct MockRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    responder: Arc<Responder>,
}

impl MockRunner {
    pub fn new(
        responder: impl Fn(&CommandSpec) -> Result<String, ExternalCommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Always succeed with `stdout`
    pub fn ok(stdout: &str) -> Self {
        let stdout = stdout.to_string();
        Self::new(move |_| Ok(stdout.clone()))
    }

    /// Always fail the way a non-zero exit does
    pub fn failing(stderr: &str) -> Self {
        let stderr = stderr.to_string();
        Self::new(move |spec| {
            Err(ExternalCommandError::Failed {
                command: spec.display(),
                code: Some(255),
                stderr: stderr.clone(),
            })
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("mock calls lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls lock poisoned").len()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn execute(
        &self,
        command: &CommandSpec,
        working_dir: &Path,
    ) -> Result<String, ExternalCommandError> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .push(Invocation {
                spec: command.clone(),
                cwd: working_dir.to_path_buf(),
            });
        (self.responder)(command)
    }
}
