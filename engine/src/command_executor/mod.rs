use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Rendered in place of output when a command prints nothing.
pub const NO_OUTPUT_MARKER: &str = "(no output)";

/// CommandExecutor runs model-proposed shell commands in the session's
/// working directory.
///
/// # Execution
/// - Each command is handed to `bash -c` (`cmd /C` on Windows)
/// - stdin set to null, stdout and stderr captured and combined
/// - Optional timeout; the child is killed when it elapses
/// - A failing command never aborts the caller's batch
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    work_dir: PathBuf,
    timeout: Option<Duration>,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to start command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{0}")]
    NonZeroExit(std::process::ExitStatus),

    #[error("Command timed out after {0:?}")]
    TimedOut(Duration),
}

/// Outcome of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub command: String,
    /// Combined stdout followed by stderr
    pub output: String,
    pub failed: bool,
    /// Why the command failed, when it did
    pub reason: Option<String>,
}

impl ExecutionResult {
    /// Output as shown to the user.
    pub fn display_output(&self) -> &str {
        if self.output.is_empty() {
            NO_OUTPUT_MARKER
        } else {
            &self.output
        }
    }
}

impl CommandExecutor {
    /// Creates an executor bound to a working directory, without a timeout.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            timeout: None,
        }
    }

    /// Sets a per-command timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Runs one command to completion and records its outcome.
    ///
    /// Never returns an error: spawn failures, non-zero exits and timeouts
    /// are all reported through `ExecutionResult::failed`.
    pub async fn run(&self, command: &str) -> ExecutionResult {
        debug!("Executing command in {:?}: {}", self.work_dir, command);

        let (output, error) = match self.spawn(command).await {
            Ok(out) => {
                let combined = combine(&out);
                if out.status.success() {
                    (combined, None)
                } else {
                    (combined, Some(CommandError::NonZeroExit(out.status)))
                }
            }
            Err(e) => (String::new(), Some(e)),
        };

        if let Some(ref e) = error {
            debug!("Command '{}' failed: {}", command, e);
        }

        ExecutionResult {
            command: command.to_string(),
            output,
            failed: error.is_some(),
            reason: error.map(|e| e.to_string()),
        }
    }

    async fn spawn(&self, command: &str) -> Result<Output, CommandError> {
        let mut cmd = shell_command(command);
        cmd.current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| CommandError::TimedOut(limit))?
                .map_err(CommandError::from),
            None => cmd.output().await.map_err(CommandError::from),
        }
    }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

fn combine(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}
