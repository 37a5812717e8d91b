//! Per-invocation retry state and the backoff schedule.

use std::time::Duration;

use indexmap::IndexSet;

use crate::CommandSpec;

/// Delay inserted before retry number `attempt`.
///
/// `2^attempt / 2` whole seconds: 0s for attempt 0, then 1s, 2s, 4s, ...
/// Saturates instead of overflowing for very large attempt counts.
pub fn backoff_delay(attempt: u32) -> Duration {
    let doubled = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(doubled / 2)
}

/// Mutable state of one supervised run.
///
/// Created when the supervisor starts and dropped when it returns; nothing is
/// carried between invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState {
    attempt: u32,
    runs: u32,
    warnings: IndexSet<String>,
    command: CommandSpec,
}

impl RetryState {
    /// Fresh state for `command`: no attempts, no warnings.
    pub fn new(command: CommandSpec) -> Self {
        Self {
            attempt: 0,
            runs: 0,
            warnings: IndexSet::new(),
            command,
        }
    }

    /// Retry attempts consumed so far. Never decreases.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Child runs started so far, including the first.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// The command launched on every attempt.
    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Records that a child run was started.
    pub fn record_run(&mut self) {
        self.runs = self.runs.saturating_add(1);
    }

    /// Returns `true` once more than `max_retries` retries have been consumed.
    pub fn is_exhausted(&self, max_retries: u32) -> bool {
        self.attempt > max_retries
    }

    /// Consumes one retry and returns the delay to wait before it.
    pub fn advance(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        backoff_delay(self.attempt)
    }

    /// Remembers a warning for the success path. Duplicates are ignored.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.insert(warning.into());
    }

    /// Accumulated warnings in first-seen order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().map(String::as_str)
    }

    /// Consumes the state, yielding its warnings in first-seen order.
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings.into_iter().collect()
    }
}
