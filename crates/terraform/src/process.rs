//! Child-process runner.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use retry::{CommandOutcome, CommandRunner, CommandSpec, ProcessExit, SupervisorError};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs commands as real child processes.
///
/// Stdin and stdout are inherited so the operator sees provisioning progress
/// live. Stderr is piped and returned in full once the child exits.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every child in `dir` instead of the current directory.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutcome, SupervisorError> {
        debug!(command = %command, env = ?command.env().keys().collect::<Vec<_>>(), "spawning child");

        let mut cmd = Command::new(command.program().as_str());
        cmd.args(command.args())
            .envs(command.env())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let spawn_error = |e: std::io::Error| SupervisorError::Spawn {
            program: command.program().to_string(),
            message: e.to_string(),
        };
        let child = cmd.spawn().map_err(spawn_error)?;
        let output = child.wait_with_output().await.map_err(spawn_error)?;

        let exit = process_exit(output.status);
        if !exit.is_success() {
            warn!(command = %command, exit_code = %exit, "child exited with failure");
        }
        Ok(CommandOutcome::new(exit, String::from_utf8_lossy(&output.stderr)))
    }
}

fn process_exit(status: ExitStatus) -> ProcessExit {
    if let Some(code) = status.code() {
        return ProcessExit::from_code(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ProcessExit::from_signal(signal);
        }
    }
    ProcessExit::from_code(1)
}
