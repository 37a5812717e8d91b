//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use retry::{CommandSpec, SupervisorError};
use supervisor::{SupervisorConfig, DEFAULT_MAX_RETRIES};
use terraform::{DEFAULT_SIGNATURE_TABLE, DEFAULT_TFVARS};

/// Log line encoding on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Run Terraform, retrying failures listed in the signature table.
///
/// Everything after the options is passed to the provisioning tool unchanged,
/// e.g. `tf-run apply -auto-approve`.
#[derive(Debug, Parser)]
#[command(name = "tf-run", version)]
pub struct CliConfig {
    /// Provisioning executable to run
    #[arg(long, env = "TF_RUN_TERRAFORM", default_value = "terraform")]
    pub terraform: String,

    /// Retries allowed before giving up
    #[arg(long, env = "TF_RUN_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Signature table mapping error substrings to remediations
    #[arg(long, env = "TF_RUN_SIGNATURES", default_value = DEFAULT_SIGNATURE_TABLE)]
    pub signatures: PathBuf,

    /// Variable file rewritten by remediations
    #[arg(long, env = "TF_RUN_TFVARS", default_value = DEFAULT_TFVARS)]
    pub tfvars: PathBuf,

    /// Extra environment variable for the child, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Log format on stderr
    #[arg(long, env = "TF_RUN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Disable coloured annotations (also disabled when NO_COLOR is set)
    #[arg(long)]
    pub no_color: bool,

    /// Arguments passed to the provisioning executable
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl CliConfig {
    /// Whether annotations should carry ANSI colours.
    pub fn color(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            max_retries: self.max_retries,
            ..SupervisorConfig::default()
        }
    }

    /// The command launched on every attempt.
    pub fn command_spec(&self) -> Result<CommandSpec, SupervisorError> {
        let command = CommandSpec::new(self.terraform.as_str())
            .ok_or_else(|| SupervisorError::config_load("--terraform", "program must not be empty"))?
            .with_args(self.args.iter().cloned());
        Ok(self
            .env
            .iter()
            .fold(command, |cmd, (key, value)| cmd.with_env(key.as_str(), value.as_str())))
    }
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
