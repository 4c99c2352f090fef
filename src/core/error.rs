//! Structured error types.
//!
//! Only run-level failures surface as [`AuditError`]: an unreadable line
//! source, an unwritable report sink, a broken configuration, or arguments
//! the command line rejected. Problems with individual log lines are
//! [`RecordError`](crate::core::record::RecordError)s and never leave the
//! ingestion step.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// System-level errors (IO, serialization).
    System,
    /// The log line source could not be opened or read.
    Source,
    /// The report sink could not be written.
    Sink,
    /// Configuration could not be loaded.
    Config,
    /// Command-line arguments were rejected.
    User,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Source => write!(f, "source"),
            Self::Sink => write!(f, "sink"),
            Self::Config => write!(f, "config"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Structured error with full context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditError {
    /// Error category for classification.
    pub category: ErrorCategory,
    /// Unique error code within category.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Component and operation that originated the error.
    pub origin: String,
    /// Whether rerunning after fixing the input can succeed.
    pub recoverable: bool,
    /// Hint for recovery action.
    pub recovery_hint: Option<String>,
    /// Additional context key-value pairs.
    pub context: HashMap<String, String>,
}

impl AuditError {
    #[must_use]
    pub fn new(
        category: ErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
            origin: origin.into(),
            recoverable: false,
            recovery_hint: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn system(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::System, code, message, origin)
    }

    /// Creates a line source error.
    #[must_use]
    pub fn source(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::Source, code, message, origin).recoverable(true)
    }

    /// Creates a report sink error.
    #[must_use]
    pub fn sink(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::Sink, code, message, origin).recoverable(true)
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::Config, code, message, origin).recoverable(true)
    }

    /// Creates a usage error for rejected arguments.
    #[must_use]
    pub fn user(
        code: impl Into<String>,
        message: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCategory::User, code, message, origin).recoverable(true)
    }
}

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.category, self.code, self.message)
    }
}

impl std::error::Error for AuditError {}

/// Result type using `AuditError`.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Exit codes for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    NotFound = 2,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AuditError::source("read_failed", "Failed to read line", "storage:line_source");
        assert!(err.to_string().contains("source"));
        assert!(err.to_string().contains("read_failed"));
    }

    #[test]
    fn error_with_context() {
        let err = AuditError::config("config_not_found", "Config file not found", "core:config")
            .with_context("path", "/tmp/missing.yaml")
            .with_hint("Pass an existing file with --config");

        assert_eq!(
            err.context.get("path"),
            Some(&"/tmp/missing.yaml".to_string())
        );
        assert!(err.recovery_hint.is_some());
        assert!(err.recoverable);
    }

    #[test]
    fn system_errors_are_not_recoverable() {
        let err = AuditError::system("serialize_failed", "boom", "core:report");
        assert!(!err.recoverable);
        assert_eq!(err.category, ErrorCategory::System);
    }

    #[test]
    fn error_serialization() {
        let err = AuditError::sink("write_failed", "Failed to write report", "storage:report_sink")
            .with_context("path", "out.json");

        let json = serde_json::to_string(&err).expect("serialize");
        let restored: AuditError = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored.category, ErrorCategory::Sink);
        assert_eq!(restored.code, "write_failed");
    }
}
