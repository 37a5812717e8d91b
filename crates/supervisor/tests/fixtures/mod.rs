//! Scripted port implementations for supervisor tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use retry::{
    CommandOutcome, CommandRunner, CommandSpec, ErrorSignature, ProcessExit, RemediationRule,
    Reporter, RetryNotice, SignatureTable, SupervisorError, VariableStore, Variables,
};
use supervisor::{Supervisor, SupervisorConfig};

/// Returns preset outcomes in order and records every command it was asked to run.
pub struct ScriptedRunner {
    outcomes: Mutex<VecDeque<CommandOutcome>>,
    commands: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new(script: impl IntoIterator<Item = (i32, &'static str)>) -> Arc<Self> {
        let outcomes = script
            .into_iter()
            .map(|(code, stderr)| CommandOutcome::new(ProcessExit::from_code(code), stderr))
            .collect();
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            commands: Mutex::new(Vec::new()),
        })
    }

    /// Fails every run with the same stderr.
    pub fn always(code: i32, stderr: &'static str, times: usize) -> Arc<Self> {
        Self::new(std::iter::repeat((code, stderr)).take(times))
    }

    pub fn runs(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutcome, SupervisorError> {
        self.commands.lock().unwrap().push(command.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SupervisorError::Spawn {
                program: command.program().to_string(),
                message: "script exhausted".into(),
            })
    }
}

/// In-memory variable store.
#[derive(Default)]
pub struct MemoryStore {
    variables: Mutex<Option<Variables>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn with(variables: Variables) -> Arc<Self> {
        Arc::new(Self {
            variables: Mutex::new(Some(variables)),
            saves: Mutex::new(0),
        })
    }

    /// A store whose document does not exist.
    pub fn missing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> Option<Variables> {
        self.variables.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl VariableStore for MemoryStore {
    async fn load(&self) -> Result<Variables, SupervisorError> {
        self.variables
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SupervisorError::config_load("memory", "no variable document"))
    }

    async fn save(&self, variables: &Variables) -> Result<(), SupervisorError> {
        *self.variables.lock().unwrap() = Some(variables.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Retrying {
        attempt: u32,
        max_retries: u32,
        delay: Duration,
        stderr: String,
    },
    VariablesUpdated(Variables),
    Warning(String),
    Unrecognized(String),
    Flush,
}

/// Records every annotation in order.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Warning(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    pub fn delays(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Retrying { delay, .. } => Some(delay.as_secs()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn retrying(&self, notice: &RetryNotice<'_>) {
        self.push(Event::Retrying {
            attempt: notice.attempt,
            max_retries: notice.max_retries,
            delay: notice.delay,
            stderr: notice.stderr.to_string(),
        });
    }

    fn variables_updated(&self, variables: &Variables) {
        self.push(Event::VariablesUpdated(variables.clone()));
    }

    fn warning(&self, warning: &str) {
        self.push(Event::Warning(warning.to_string()));
    }

    fn unrecognized_failure(&self, stderr: &str) {
        self.push(Event::Unrecognized(stderr.to_string()));
    }

    fn flush(&self) {
        self.push(Event::Flush);
    }
}

pub fn rule(warn: Option<&str>, update: Option<serde_json::Value>) -> RemediationRule {
    RemediationRule {
        warn: warn.map(str::to_string),
        update: update.map(|v| serde_json::from_value(v).unwrap()),
    }
}

pub fn table(entries: Vec<(&str, RemediationRule)>) -> SignatureTable {
    SignatureTable::from_entries(
        entries
            .into_iter()
            .map(|(sig, rule)| (ErrorSignature::new(sig).unwrap(), rule)),
    )
}

pub fn terraform_apply() -> CommandSpec {
    CommandSpec::new("terraform").unwrap().with_args(["apply", "-auto-approve"])
}

pub struct Harness {
    pub runner: Arc<ScriptedRunner>,
    pub store: Arc<MemoryStore>,
    pub reporter: Arc<RecordingReporter>,
    pub supervisor: Supervisor,
}

pub fn harness(
    max_retries: u32,
    table: SignatureTable,
    runner: Arc<ScriptedRunner>,
    store: Arc<MemoryStore>,
) -> Harness {
    let reporter = RecordingReporter::new();
    let supervisor = Supervisor::new(
        SupervisorConfig {
            max_retries,
            ..SupervisorConfig::default()
        },
        table,
        runner.clone(),
        store.clone(),
        reporter.clone(),
    );
    Harness {
        runner,
        store,
        reporter,
        supervisor,
    }
}
