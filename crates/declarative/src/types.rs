//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Terminal result of one reconciliation
///
/// Exactly one Outcome is produced per resource invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Current state already matches desired state
    NoChange { message: String },
    /// Dry run: a mutation would have been performed
    WouldChange { message: String },
    /// A mutation was performed
    Changed { message: String },
    /// Reconciliation failed
    Failed(Failure),
}

impl Outcome {
    pub fn no_change(message: impl Into<String>) -> Self {
        Self::NoChange {
            message: message.into(),
        }
    }

    pub fn would_change(message: impl Into<String>) -> Self {
        Self::WouldChange {
            message: message.into(),
        }
    }

    pub fn changed(message: impl Into<String>) -> Self {
        Self::Changed {
            message: message.into(),
        }
    }

    /// Human-readable message for any variant
    pub fn message(&self) -> &str {
        match self {
            Self::NoChange { message }
            | Self::WouldChange { message }
            | Self::Changed { message } => message,
            Self::Failed(failure) => &failure.reason,
        }
    }

    /// Whether a mutation happened or would happen
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed { .. } | Self::WouldChange { .. })
    }

    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A fatal reconciliation error, flattened for reporting
///
/// Raw stdout/stderr of the failing external command are kept for diagnosis
/// and are empty when the failure happened before any command ran.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Error)]
#[error("{reason}")]
pub struct Failure {
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl Failure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Default::default()
        }
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Self::Failed(failure)
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub changed: usize,
    pub would_change: usize,
    pub no_change: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.changed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.changed + self.would_change + self.no_change + self.failed
    }

    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::NoChange { .. } => self.no_change += 1,
            Outcome::WouldChange { .. } => self.would_change += 1,
            Outcome::Changed { .. } => self.changed += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just report what would happen
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_outcomes() {
        let mut summary = ExecuteSummary::default();
        summary.add_outcome(&Outcome::changed("Profile updated"));
        summary.add_outcome(&Outcome::no_change("Profile matches configuration"));
        summary.add_outcome(&Outcome::Failed(Failure::new("boom")));

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.total_changes(), 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::would_change("Volume would be exported")).unwrap();
        assert_eq!(json["status"], "would_change");
        assert_eq!(json["message"], "Volume would be exported");

        let failure = Failure::new("Failed to delete profile").with_output("", "in use");
        let failed = Outcome::Failed(failure);
        let json = serde_json::to_value(failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stderr"], "in use");
        assert!(json.get("stdout").is_none());
    }

    #[test]
    fn test_outcome_is_change() {
        assert!(Outcome::changed("x").is_change());
        assert!(Outcome::would_change("x").is_change());
        assert!(!Outcome::no_change("x").is_change());
        assert!(!Outcome::Failed(Failure::new("x")).is_change());
    }
}
