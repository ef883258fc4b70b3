//! Advisory findings collected during a validation pass

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Kind of non-fatal finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Actual object carries keys the exact expectation does not mention
    ExtraProperties,
    /// Response took longer than `expectedResponseTime`
    SlowResponse,
    /// Security header present with a weak value
    InsecureHeader,
    /// Security header absent
    MissingHeader,
    /// Sensitive-looking field without a masking marker
    UnmaskedField,
    /// Monetary string with more than two decimal places
    ExcessPrecision,
    /// Custom rule type this engine does not know
    UnknownRule,
}

/// A single advisory finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

/// Check passes that ran for one response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Status,
    ResponseTime,
    SecurityHeaders,
    ExactBody,
    SubsetBody,
    NonEmpty,
    Amounts,
    TransactionIds,
    Masking,
    Custom,
}

/// Outcome of a successful validation: warnings plus the passes executed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub warnings: Vec<Warning>,
    pub checks_run: Vec<Check>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it on the log
    pub fn warn(&mut self, kind: WarningKind, path: Option<String>, message: impl Into<String>) {
        let message = message.into();
        match &path {
            Some(p) => warn!(kind = ?kind, path = %p, "{}", message),
            None => warn!(kind = ?kind, "{}", message),
        }
        self.warnings.push(Warning {
            kind,
            path,
            message,
        });
    }

    pub fn record(&mut self, check: Check) {
        self.checks_run.push(check);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}
