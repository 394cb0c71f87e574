// SPDX-License-Identifier: MIT OR Apache-2.0
//! Completion statuses and user-facing notifications.

use serde::{Deserialize, Serialize};

/// How an operator invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorStatus {
    /// Mutation applied
    Finished,
    /// Preconditions unmet; nothing changed
    Cancelled,
    /// No eligible work; the triggering input should reach other handlers
    PassThrough,
    /// Gesture in progress
    RunningModal,
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportLevel {
    /// Informational
    Info,
    /// Something was skipped but the operator carried on
    Warning,
    /// The operator was cancelled
    Error,
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Severity
    pub level: ReportLevel,
    /// Message text
    pub message: String,
}

/// Notifications collected during one operator call
#[derive(Debug, Clone, Default)]
pub struct Reports {
    entries: Vec<Report>,
}

impl Reports {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational message
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.entries.push(Report { level: ReportLevel::Info, message });
    }

    /// Record a warning
    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.entries.push(Report { level: ReportLevel::Warning, message });
    }

    /// Record an error
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.entries.push(Report { level: ReportLevel::Error, message });
    }

    /// All notifications, in emission order
    pub fn entries(&self) -> &[Report] {
        &self.entries
    }

    /// Notifications of one severity
    pub fn with_level(&self, level: ReportLevel) -> impl Iterator<Item = &Report> {
        self.entries.iter().filter(move |r| r.level == level)
    }

    /// Number of warnings
    pub fn warning_count(&self) -> usize {
        self.with_level(ReportLevel::Warning).count()
    }

    /// Whether nothing was reported
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the collected notifications
    pub fn into_entries(self) -> Vec<Report> {
        self.entries
    }
}
