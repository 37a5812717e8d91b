//! tf-run CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — flags with environment fallbacks (see [`config`]).
//! 2. **Wire observability** — `tracing-subscriber` on stderr plus an optional
//!    OpenTelemetry OTLP exporter (see [`telemetry`]).
//! 3. **Construct infrastructure** — load the signature table and create the
//!    process runner, tfvars store, and console reporter, then inject them into
//!    the [`Supervisor`].
//! 4. **Exit** — this is the only place the process exit status is decided.
//!    Success is 0; a terminal failure exits with
//!    [`SupervisorError::exit_code`].

mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use retry::{RunId, SupervisorError};
use supervisor::{RunSummary, Supervisor};
use terraform::{load_signature_table, paint, ConsoleReporter, ProcessRunner, Style, TfvarsFile};
use tracing::{error, info, info_span, Instrument};

use crate::config::CliConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let config = CliConfig::parse();

    let telemetry = match telemetry::init(config.log_format) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("{e:#}");
            return exit_code(retry::EXIT_CONFIG_LOAD);
        }
    };

    let run_id = RunId::new_random();
    let code = match supervise(&config)
        .instrument(info_span!("tf_run", run_id = %run_id.as_uuid()))
        .await
    {
        Ok(summary) => {
            info!(%run_id, runs = summary.runs, retries = summary.retries, "provisioning succeeded");
            0
        }
        Err(err) => {
            error!(%run_id, error = %err, "provisioning failed");
            if let Some(message) = fatal_message(&err) {
                eprintln!("{}", paint(&message, Style::Error, config.color()));
            }
            err.exit_code()
        }
    };

    telemetry.shutdown();
    exit_code(code)
}

async fn supervise(config: &CliConfig) -> Result<RunSummary, SupervisorError> {
    let table = load_signature_table(&config.signatures).await?;
    let command = config.command_spec()?;

    let supervisor = Supervisor::new(
        config.supervisor_config(),
        table,
        Arc::new(ProcessRunner::new()),
        Arc::new(TfvarsFile::new(&config.tfvars)),
        Arc::new(ConsoleReporter::stdout(config.color())),
    );
    supervisor.run(&command).await
}

/// Message printed at exit for a terminal failure.
///
/// `None` for unrecognised failures: the child's stderr has already been
/// echoed (or deliberately suppressed) by the supervisor.
fn fatal_message(err: &SupervisorError) -> Option<String> {
    match err {
        SupervisorError::UnrecognizedFailure { .. } => None,
        other => Some(other.to_string()),
    }
}

/// Process status byte for `code`. Codes outside `0..=255` exit as 1.
fn status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(status_byte(code))
}
