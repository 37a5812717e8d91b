//! tf-run retry supervisor.
//!
//! Drives the wrapped provisioning command through repeated attempts:
//!
//! 1. run the command and capture its stderr;
//! 2. on success, surface accumulated warnings and stop;
//! 3. on failure, give up if the retry budget is spent;
//! 4. otherwise classify stderr against the [`SignatureTable`]. A match applies
//!    the remediation (variable updates, warning) and sleeps for the backoff
//!    delay before the next attempt; no match ends the run with the child's
//!    exit code.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The supervisor sequences calls between the domain
//! rules in [`retry`] and the port traits ([`CommandRunner`],
//! [`VariableStore`], [`Reporter`]). It owns no I/O of its own apart from the
//! backoff sleep.
//!
//! Exactly one child runs at a time; the next attempt starts only after the
//! previous one has been awaited and the delay has elapsed.

use std::sync::Arc;

use retry::{
    CommandRunner, CommandSpec, FailureClass, Reporter, RetryNotice, RetryState, SignatureTable,
    SupervisorError, VariableStore,
};
use tracing::{debug, info, instrument, warn};

/// Retry budget used when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Stderr marker meaning the real error was already printed by a nested tool.
pub const UPSTREAM_REPORTED_MARKER: &str = "Error running command 'ANSIBLE_";

/// Tunables for one [`Supervisor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Retries allowed before giving up. The run is abandoned once the
    /// attempt counter exceeds this value.
    pub max_retries: u32,

    /// Stderr containing this text is not echoed when the run gives up on an
    /// unrecognised failure. Retry notices always include stderr.
    pub upstream_marker: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            upstream_marker: Some(UPSTREAM_REPORTED_MARKER.to_string()),
        }
    }
}

impl SupervisorConfig {
    fn reported_upstream(&self, stderr: &str) -> bool {
        self.upstream_marker
            .as_deref()
            .is_some_and(|marker| stderr.contains(marker))
    }
}

/// How a successful run went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Child runs started, including the successful one.
    pub runs: u32,
    /// Retries consumed.
    pub retries: u32,
    /// Warnings emitted on success, in first-seen order.
    pub warnings: Vec<String>,
}

/// The retry state machine.
pub struct Supervisor {
    config: SupervisorConfig,
    table: SignatureTable,
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn VariableStore>,
    reporter: Arc<dyn Reporter>,
}

impl Supervisor {
    pub fn new(
        config: SupervisorConfig,
        table: SignatureTable,
        runner: Arc<dyn CommandRunner>,
        store: Arc<dyn VariableStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            table,
            runner,
            store,
            reporter,
        }
    }

    /// Runs `command` until it succeeds or fails terminally.
    ///
    /// # Errors
    ///
    /// - [`SupervisorError::RetryBudgetExhausted`] when recognised failures
    ///   outlast `max_retries`.
    /// - [`SupervisorError::UnrecognizedFailure`] when stderr matches no
    ///   signature; carries the child's exit code.
    /// - [`SupervisorError::ConfigLoad`] when a remediation cannot read or
    ///   write the variable store.
    /// - [`SupervisorError::Spawn`] when the command cannot be started.
    #[instrument(skip_all, fields(command = %command, max_retries = self.config.max_retries))]
    pub async fn run(&self, command: &CommandSpec) -> Result<RunSummary, SupervisorError> {
        let mut state = RetryState::new(command.clone());

        loop {
            state.record_run();
            debug!(run = state.runs(), attempt = state.attempt(), "starting command");
            let outcome = self.runner.run(state.command()).await?;

            if outcome.exit.is_success() {
                for warning in state.warnings() {
                    self.reporter.warning(warning);
                }
                info!(runs = state.runs(), retries = state.attempt(), "command succeeded");
                return Ok(RunSummary {
                    runs: state.runs(),
                    retries: state.attempt(),
                    warnings: state.into_warnings(),
                });
            }

            if state.is_exhausted(self.config.max_retries) {
                warn!(attempts = state.attempt(), exit_code = %outcome.exit, "retry budget exhausted");
                return Err(SupervisorError::RetryBudgetExhausted {
                    attempts: state.attempt(),
                });
            }

            // Signatures match the raw text; the trimmed form is only for display.
            let stderr = outcome.stderr.trim();
            match self.table.classify(&outcome.stderr) {
                FailureClass::Retryable { signature, rule } => {
                    let delay = state.advance();
                    info!(
                        %signature,
                        attempt = state.attempt(),
                        delay_secs = delay.as_secs(),
                        exit_code = %outcome.exit,
                        "retryable failure"
                    );
                    self.reporter.retrying(&RetryNotice {
                        attempt: state.attempt(),
                        max_retries: self.config.max_retries,
                        delay,
                        stderr,
                    });

                    if let Some(updates) = rule.updates() {
                        let variables = self.store.merge(updates).await?;
                        debug!(updated = updates.len(), total = variables.len(), "variable store updated");
                        self.reporter.variables_updated(&variables);
                    }
                    if let Some(warning) = rule.warning() {
                        state.add_warning(warning);
                    }

                    self.reporter.flush();
                    tokio::time::sleep(delay).await;
                }
                FailureClass::NonRetryable => {
                    if !self.config.reported_upstream(stderr) {
                        self.reporter.unrecognized_failure(stderr);
                    }
                    warn!(exit_code = %outcome.exit, "unrecognised failure, giving up");
                    return Err(SupervisorError::UnrecognizedFailure {
                        exit_code: outcome.exit.code(),
                    });
                }
            }
        }
    }
}
