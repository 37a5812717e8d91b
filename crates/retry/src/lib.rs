//! Retry domain for tf-run.
//!
//! This crate holds every concept the supervisor reasons about: error
//! signatures and their remediations, the provisioning variables a remediation
//! rewrites, the retry state and backoff schedule, the terminal error taxonomy,
//! and the port traits through which the supervisor reaches the outside world.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** No I/O happens here. Process
//! spawning and file access are implemented in the `terraform` crate.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `ErrorSignature`, `ProgramName`, `RunId` |
//! | [`signatures`] | `RemediationRule`, ordered `SignatureTable` |
//! | [`variables`] | `Variables` and merge semantics |
//! | [`state`] | `RetryState`, `backoff_delay` |
//! | [`errors`] | `FailureClass`, `SupervisorError`, exit codes |
//! | [`ports`] | `CommandSpec`, `CommandRunner`, `VariableStore`, `Reporter` |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod signatures;
pub mod state;
pub mod variables;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{
    FailureClass, SupervisorError, EXIT_CONFIG_LOAD, EXIT_RETRIES_EXHAUSTED, EXIT_SPAWN_FAILED,
};
pub use identifiers::{ErrorSignature, ProgramName, RunId};
pub use ports::{
    CommandOutcome, CommandRunner, CommandSpec, ProcessExit, Reporter, RetryNotice, VariableStore,
};
pub use signatures::{RemediationRule, SignatureTable, TableError};
pub use state::{backoff_delay, RetryState};
pub use variables::Variables;
