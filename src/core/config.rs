//! Audit configuration.
//!
//! The defaults are the values the migration audit was built around; a YAML
//! file can override any subset of them.

use crate::core::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "PARITY_AUDIT_CONFIG";

const DEFAULT_AUDITED_EVENT_TYPES: [&str; 5] = [
    "Reservation Created",
    "Reservation Accepted",
    "Reservation Wrapup",
    "Task Wrapup",
    "Reservation Completed",
];

const fn default_tolerance() -> f64 {
    5.0
}

fn default_audited_event_types() -> Vec<String> {
    DEFAULT_AUDITED_EVENT_TYPES
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_duplicate_exempt_event_type() -> String {
    "Task Updated".to_string()
}

fn default_known_source() -> String {
    "Regal Voice".to_string()
}

/// Tunables for one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Event types that are structurally diffed.
    #[serde(default = "default_audited_event_types")]
    pub audited_event_types: Vec<String>,
    /// Event type allowed to repeat on the rewritten side.
    #[serde(default = "default_duplicate_exempt_event_type")]
    pub duplicate_exempt_event_type: String,
    /// Largest tolerated `age` drift.
    #[serde(default = "default_tolerance")]
    pub age_tolerance: f64,
    /// Largest tolerated `createdAt` drift.
    #[serde(default = "default_tolerance")]
    pub created_at_tolerance: f64,
    /// `source` value the rewritten path may add without it counting.
    #[serde(default = "default_known_source")]
    pub known_source: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            audited_event_types: default_audited_event_types(),
            duplicate_exempt_event_type: default_duplicate_exempt_event_type(),
            age_tolerance: default_tolerance(),
            created_at_tolerance: default_tolerance(),
            known_source: default_known_source(),
        }
    }
}

impl AuditConfig {
    #[must_use]
    pub fn is_audited(&self, event_type: &str) -> bool {
        self.audited_event_types.iter().any(|t| t == event_type)
    }

    #[must_use]
    pub fn is_duplicate_exempt(&self, event_type: &str) -> bool {
        self.duplicate_exempt_event_type == event_type
    }

    /// Reads a config from a YAML file.
    ///
    /// # Errors
    /// Returns a config error if the file is missing, unreadable or invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            let code = if e.kind() == std::io::ErrorKind::NotFound {
                "config_not_found"
            } else {
                "config_read_failed"
            };
            AuditError::config(
                code,
                format!("Failed to read config: {e}"),
                "core:config:from_file",
            )
            .with_context("path", path.display().to_string())
        })?;

        serde_yaml::from_str(&raw).map_err(|e| {
            AuditError::config(
                "config_invalid",
                format!("Invalid config: {e}"),
                "core:config:from_file",
            )
            .with_context("path", path.display().to_string())
            .with_hint("Run `parity-audit config show` for the expected fields")
        })
    }

    /// Resolves the effective config: explicit path, then the
    /// `PARITY_AUDIT_CONFIG` variable, then the user config file if present,
    /// then the built-in defaults.
    ///
    /// # Errors
    /// Returns a config error if a named file cannot be loaded.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Self::from_file(Path::new(&path));
            }
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/parity-audit/config.yaml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("parity-audit").join("config.yaml"))
}
