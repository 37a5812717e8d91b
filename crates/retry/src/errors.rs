//! Failure classification and terminal error types for the retry domain.
//!
//! [`FailureClass`] is the verdict the supervisor reaches for every non-zero
//! child exit: either a known signature matched and the failure is absorbed
//! locally, or it did not and the run must end.
//!
//! [`SupervisorError`] covers every condition that terminates the supervisor.
//! Retryable failures never become a [`SupervisorError`]; they are handled
//! inside the retry loop and only surface through the reporter.

use thiserror::Error;

use crate::{ErrorSignature, RemediationRule};

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Exit status used when the retry budget is exhausted.
pub const EXIT_RETRIES_EXHAUSTED: i32 = 1;

/// Exit status used when the signature table or variable store cannot be read.
pub const EXIT_CONFIG_LOAD: i32 = 2;

/// Exit status used when the wrapped program cannot be started.
pub const EXIT_SPAWN_FAILED: i32 = 127;

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

/// Whether a failed child run is recoverable and, if so, how.
///
/// Produced by [`crate::SignatureTable::classify`] from the captured stderr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureClass<'a> {
    /// A known signature occurs in stderr; apply the rule and retry.
    Retryable {
        /// The first signature (in table order) found in stderr.
        signature: &'a ErrorSignature,
        /// The remediation attached to that signature.
        rule: &'a RemediationRule,
    },
    /// Nothing in the table matched; the failure is terminal.
    NonRetryable,
}

impl FailureClass<'_> {
    /// Returns `true` if the failure can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

// ---------------------------------------------------------------------------
// Terminal errors
// ---------------------------------------------------------------------------

/// Conditions that end a supervised run without further retries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupervisorError {
    /// The child kept failing with recognised errors until the budget ran out.
    #[error("Failure after {attempts} retries.")]
    RetryBudgetExhausted {
        /// Retry attempts consumed before giving up.
        attempts: u32,
    },

    /// The child failed and no signature in the table matched its stderr.
    ///
    /// The captured stderr has already been reported (unless it carried the
    /// upstream marker) by the time this error is returned.
    #[error("Command failed with unrecognised error (exit code {exit_code})")]
    UnrecognizedFailure {
        /// Exit code of the final child run, propagated unchanged.
        exit_code: i32,
    },

    /// The signature table or the variable store is missing or malformed.
    ///
    /// Never retried: a human must fix the document before re-running.
    #[error("Configuration error in '{path}': {message}")]
    ConfigLoad {
        /// Path of the offending document.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// The wrapped program could not be started or awaited.
    #[error("Failed to run '{program}': {message}")]
    Spawn {
        /// Program that was being launched.
        program: String,
        /// Underlying OS error text.
        message: String,
    },
}

impl SupervisorError {
    /// Builds a [`SupervisorError::ConfigLoad`] from any displayable cause.
    pub fn config_load(path: impl std::fmt::Display, cause: impl std::fmt::Display) -> Self {
        Self::ConfigLoad {
            path: path.to_string(),
            message: cause.to_string(),
        }
    }

    /// Process exit status this error terminates with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RetryBudgetExhausted { .. } => EXIT_RETRIES_EXHAUSTED,
            Self::UnrecognizedFailure { exit_code } => *exit_code,
            Self::ConfigLoad { .. } => EXIT_CONFIG_LOAD,
            Self::Spawn { .. } => EXIT_SPAWN_FAILED,
        }
    }
}
