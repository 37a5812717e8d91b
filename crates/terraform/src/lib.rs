//! tf-run infrastructure adapters.
//!
//! Implements the port traits defined in the [`retry`] crate against the real
//! world:
//!
//! - [`ProcessRunner`] — launches the provisioning tool with `tokio::process`,
//!   inheriting stdout and capturing stderr.
//! - [`TfvarsFile`] — the `terraform.tfvars.json` variable store.
//! - [`ConsoleReporter`] — coloured operator annotations on stdout.
//! - [`load_signature_table`] — reads `retries.json`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File formats, process plumbing, and terminal rendering
//! live here. The supervisor sees only the [`retry`] traits.

pub mod console;
pub mod process;
pub mod table;
pub mod tfvars;

pub use console::{paint, ConsoleReporter, Style};
pub use process::ProcessRunner;
pub use table::{load_signature_table, DEFAULT_SIGNATURE_TABLE};
pub use tfvars::{TfvarsFile, DEFAULT_TFVARS};
