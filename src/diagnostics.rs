//! Structured reporting of generation failures and notes.
//!
//! Every report is kept in a transcript for the run and mirrored as a
//! tracing event. The transcript is written once, at the end of the run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::codegen::output::OutputSink;
use crate::error::{Error, Result};

/// Name of the transcript output slot.
pub const TRANSCRIPT_NAME: &str = "rifgen-log.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        })
    }
}

/// One reported event, attributed to a schema element when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            Some(element) => write!(f, "[{}] at '{}': {}", self.severity, element, self.message),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// Transcript of one generation run.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    started: DateTime<Utc>,
    entries: Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            started: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn report(&mut self, severity: Severity, element: Option<String>, message: impl Into<String>) {
        let message = message.into();
        let shown = element.as_deref().unwrap_or("-");
        match severity {
            Severity::Error => error!(element = shown, "{}", message),
            Severity::Warning => warn!(element = shown, "{}", message),
            Severity::Note => info!(element = shown, "{}", message),
        }
        self.entries.push(Diagnostic {
            severity,
            element,
            message,
        });
    }

    pub fn error(&mut self, element: Option<String>, message: impl Into<String>) {
        self.report(Severity::Error, element, message);
    }

    pub fn warning(&mut self, element: Option<String>, message: impl Into<String>) {
        self.report(Severity::Warning, element, message);
    }

    pub fn note(&mut self, element: Option<String>, message: impl Into<String>) {
        self.report(Severity::Note, element, message);
    }

    /// Report `err` as an error, attributed to its schema element.
    pub fn error_from(&mut self, err: &Error) {
        self.report(Severity::Error, err.schema_element(), err.to_string());
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Line-oriented transcript, one line per event.
    pub fn transcript(&self) -> String {
        let mut out = format!("rifgen run started {}\n", self.started.to_rfc3339());
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }

    /// Write the transcript to its output slot.
    pub fn write_transcript(&self, sink: &mut dyn OutputSink) -> Result<()> {
        sink.write(TRANSCRIPT_NAME, &self.transcript())
    }
}
