//! Port traits the supervisor drives, and the values that cross them.
//!
//! Infrastructure crates implement these; the supervisor only ever sees the
//! traits. Tests substitute scripted implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{ProgramName, SupervisorError, Variables};

// ---------------------------------------------------------------------------
// Command description
// ---------------------------------------------------------------------------

/// Everything needed to launch one attempt of the wrapped command.
///
/// The environment map holds additions applied to that single child on top
/// of the inherited environment. The supervisor's own process environment is
/// never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: ProgramName,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Creates a command with no arguments, or `None` if `program` is empty.
    pub fn new(program: impl Into<String>) -> Option<Self> {
        Some(Self {
            program: ProgramName::new(program)?,
            args: Vec::new(),
            env: BTreeMap::new(),
        })
    }

    /// Appends arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for the child.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Executable launched on every attempt.
    pub fn program(&self) -> &ProgramName {
        &self.program
    }

    /// Arguments passed through to the program unchanged.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Variables set on the child in addition to the inherited environment.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Child outcome
// ---------------------------------------------------------------------------

/// Exit status of a finished child.
///
/// A child killed by a signal is recorded as `128 + signal`, matching what a
/// shell would report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessExit(i32);

impl ProcessExit {
    pub const SUCCESS: Self = Self(0);

    /// Status of a child that exited normally with `code`.
    pub fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// Status of a child killed by `signal`, recorded as `128 + signal`.
    pub fn from_signal(signal: i32) -> Self {
        Self(128 + signal)
    }

    /// Numeric status as a shell would report it.
    pub fn code(self) -> i32 {
        self.0
    }

    /// True for a zero exit status.
    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the supervisor observes of one child run.
///
/// Stdout is not here: it goes straight to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit: ProcessExit,
    /// Complete standard-error text of the run.
    pub stderr: String,
}

impl CommandOutcome {
    pub fn new(exit: ProcessExit, stderr: impl Into<String>) -> Self {
        Self {
            exit,
            stderr: stderr.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Runs the wrapped command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Launches `command` and waits for it, capturing stderr in full.
    ///
    /// A non-zero exit is a normal [`CommandOutcome`], not an error. `Err` is
    /// reserved for failing to start or await the child.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutcome, SupervisorError>;
}

/// Persistent provisioning variables consumed by the next child run.
#[async_trait]
pub trait VariableStore: Send + Sync {
    /// Reads the current variables.
    async fn load(&self) -> Result<Variables, SupervisorError>;

    /// Replaces the stored variables with `variables`.
    async fn save(&self, variables: &Variables) -> Result<(), SupervisorError>;

    /// Read-merge-write: applies `updates` and returns the post-merge contents.
    async fn merge(&self, updates: &Variables) -> Result<Variables, SupervisorError> {
        let mut variables = self.load().await?;
        variables.merge(updates);
        self.save(&variables).await?;
        Ok(variables)
    }
}

/// A retry about to happen, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryNotice<'a> {
    /// Retry number, starting at 1.
    pub attempt: u32,
    pub max_retries: u32,
    pub delay: std::time::Duration,
    /// Stderr of the failed run, trimmed.
    pub stderr: &'a str,
}

/// Operator-facing annotations.
///
/// Implementations decide the rendering (console colours, CI log commands);
/// the supervisor decides when each annotation is due.
pub trait Reporter: Send + Sync {
    /// A recognised failure is about to be retried.
    fn retrying(&self, notice: &RetryNotice<'_>);

    /// A remediation rewrote the variable store; `variables` is the new content.
    fn variables_updated(&self, variables: &Variables);

    /// A remediation warning, emitted once on eventual success.
    fn warning(&self, warning: &str);

    /// Stderr of a run that failed with no matching signature.
    fn unrecognized_failure(&self, stderr: &str);

    /// Pushes any buffered output before the supervisor blocks.
    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_spec_requires_a_program() {
        assert!(CommandSpec::new("").is_none());
    }

    #[test]
    fn command_spec_displays_program_and_args() {
        let cmd = CommandSpec::new("terraform")
            .unwrap()
            .with_args(["apply", "-auto-approve"])
            .with_env("TF_IN_AUTOMATION", "1");
        assert_eq!(cmd.to_string(), "terraform apply -auto-approve");
        assert_eq!(cmd.env().get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
    }

    #[test]
    fn signal_exit_uses_shell_convention() {
        assert_eq!(ProcessExit::from_signal(9).code(), 137);
        assert!(!ProcessExit::from_signal(9).is_success());
        assert!(ProcessExit::SUCCESS.is_success());
    }
}
