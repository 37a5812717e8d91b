//! Console annotations for the operator.
//!
//! Annotations are written to stdout so they interleave with the provisioning
//! tool's own (inherited) output in the order they happened.

use std::io::Write;
use std::sync::Mutex;

use retry::{Reporter, RetryNotice, Variables};

/// Visual weight of an annotation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Error,
    Warning,
    Notice,
}

impl Style {
    fn ansi(self) -> &'static str {
        match self {
            Self::Error => "\x1b[31m",
            Self::Warning => "\x1b[33m",
            Self::Notice => "\x1b[32m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Wraps `text` in the ANSI colour for `style` when `color` is set.
pub fn paint(text: &str, style: Style, color: bool) -> String {
    if color {
        format!("{}{text}{RESET}", style.ansi())
    } else {
        text.to_string()
    }
}

/// [`Reporter`] that writes human-readable annotations to a stream.
pub struct ConsoleReporter<W: Write + Send> {
    out: Mutex<W>,
    color: bool,
}

impl ConsoleReporter<std::io::Stdout> {
    /// Reporter writing to the process's stdout.
    pub fn stdout(color: bool) -> Self {
        Self::new(std::io::stdout(), color)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            color,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, header: Option<(&str, Style)>, body: Option<&str>) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Write errors are ignored.
        if let Some((text, style)) = header {
            let _ = writeln!(out, "{}", paint(text, style, self.color));
        }
        if let Some(body) = body {
            let _ = writeln!(out, "{body}");
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn retrying(&self, notice: &RetryNotice<'_>) {
        let header = format!(
            "Error, retrying after {}s ({}/{}), stderr:",
            notice.delay.as_secs(),
            notice.attempt,
            notice.max_retries
        );
        self.emit(Some((header.as_str(), Style::Error)), Some(notice.stderr));
    }

    fn variables_updated(&self, variables: &Variables) {
        self.emit(
            Some(("Updated provisioning variables:", Style::Notice)),
            Some(variables.to_pretty_json().as_str()),
        );
    }

    fn warning(&self, warning: &str) {
        let line = format!("WARNING: {warning}");
        self.emit(Some((line.as_str(), Style::Warning)), None);
    }

    fn unrecognized_failure(&self, stderr: &str) {
        self.emit(None, Some(stderr));
    }

    fn flush(&self) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = out.flush();
    }
}
