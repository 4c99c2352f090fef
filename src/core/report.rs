//! Audit result structure and its aggregator.
//!
//! The serialized form is the report consumers already read, so field names
//! are fixed: `missingFlagOn` holds event types the rewritten (flag on) path
//! never emitted, `missingFlagOff` the ones the legacy path never emitted.

use crate::core::diff::DiffEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A `(task, event type)` pair whose canonical payloads matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEntry {
    pub task_identity: String,
    pub event_type: String,
    /// Paths that differed but were tolerated. Empty when the payloads were
    /// identical.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerated_paths: Vec<String>,
}

/// One surviving field difference with the context needed to triage it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffContext {
    pub task_identity: String,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewritten_value: Option<Value>,
}

/// Findings, each keyed by event type (or field path for `diff`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFailures {
    pub missing_flag_on: BTreeMap<String, Vec<String>>,
    pub missing_flag_off: BTreeMap<String, Vec<String>>,
    pub diff: BTreeMap<String, Vec<DiffContext>>,
    pub duplicates: BTreeMap<String, Vec<String>>,
}

/// The full output of one audit run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub success: Vec<SuccessEntry>,
    pub failure: AuditFailures,
}

impl AuditResult {
    /// Number of `(task, event type)` pairs with at least one surviving diff.
    #[must_use]
    pub fn diff_pair_count(&self) -> usize {
        let mut pairs: Vec<(&str, &str)> = self
            .failure
            .diff
            .values()
            .flatten()
            .map(|c| (c.task_identity.as_str(), c.event_type.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs.len()
    }

    #[must_use]
    pub fn tolerated_success_count(&self) -> usize {
        self.success
            .iter()
            .filter(|s| !s.tolerated_paths.is_empty())
            .count()
    }
}

fn count_entries<T>(map: &BTreeMap<String, Vec<T>>) -> usize {
    map.values().map(Vec::len).sum()
}

/// Counts for each section of a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
    pub success: usize,
    pub tolerated_success: usize,
    pub missing_on_rewritten: usize,
    pub missing_on_legacy: usize,
    pub duplicates: usize,
    pub diff_entries: usize,
    pub diff_pairs: usize,
}

impl From<&AuditResult> for ResultCounts {
    fn from(result: &AuditResult) -> Self {
        Self {
            success: result.success.len(),
            tolerated_success: result.tolerated_success_count(),
            missing_on_rewritten: count_entries(&result.failure.missing_flag_on),
            missing_on_legacy: count_entries(&result.failure.missing_flag_off),
            duplicates: count_entries(&result.failure.duplicates),
            diff_entries: count_entries(&result.failure.diff),
            diff_pairs: result.diff_pair_count(),
        }
    }
}

/// Accumulates findings for one run. Append-only; consumed by
/// [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct ReportAggregator {
    result: AuditResult,
}

impl ReportAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a success. `tolerated` holds the raw entries a rule
    /// suppressed; it is empty when the payloads matched exactly.
    pub fn record_success(
        &mut self,
        task_identity: &str,
        event_type: &str,
        tolerated: &[DiffEntry],
    ) {
        self.result.success.push(SuccessEntry {
            task_identity: task_identity.to_string(),
            event_type: event_type.to_string(),
            tolerated_paths: tolerated.iter().map(|e| e.path.to_string()).collect(),
        });
    }

    pub fn record_missing_on_rewritten(&mut self, task_identity: &str, event_type: &str) {
        push_task(&mut self.result.failure.missing_flag_on, event_type, task_identity);
    }

    pub fn record_missing_on_legacy(&mut self, task_identity: &str, event_type: &str) {
        push_task(&mut self.result.failure.missing_flag_off, event_type, task_identity);
    }

    pub fn record_duplicate(&mut self, task_identity: &str, event_type: &str) {
        push_task(&mut self.result.failure.duplicates, event_type, task_identity);
    }

    /// Records each surviving entry under its dotted path. Entries without a
    /// path cannot be keyed and are logged instead.
    pub fn record_diff(&mut self, task_identity: &str, event_type: &str, entries: Vec<DiffEntry>) {
        for entry in entries {
            if entry.path.is_empty() {
                tracing::error!(
                    task_identity,
                    event_type,
                    "diff entry has no field path; skipping"
                );
                continue;
            }
            self.result
                .failure
                .diff
                .entry(entry.path.to_string())
                .or_default()
                .push(DiffContext {
                    task_identity: task_identity.to_string(),
                    event_type: event_type.to_string(),
                    legacy_value: entry.legacy,
                    rewritten_value: entry.rewritten,
                });
        }
    }

    #[must_use]
    pub fn finish(self) -> AuditResult {
        self.result
    }
}

fn push_task(map: &mut BTreeMap<String, Vec<String>>, event_type: &str, task_identity: &str) {
    map.entry(event_type.to_string())
        .or_default()
        .push(task_identity.to_string());
}
