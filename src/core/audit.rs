//! Per-task audit: duplicate detection and cross-variant comparison.

use crate::core::config::AuditConfig;
use crate::core::diff::{diff_values, DiffEntry};
use crate::core::grouping::TaskGroup;
use crate::core::report::ReportAggregator;
use crate::core::tolerance::ToleranceFilter;

/// Result of auditing one event type for one task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Canonical payloads matched. `tolerated` holds differences a tolerance
    /// rule suppressed.
    Success {
        event_type: String,
        tolerated: Vec<DiffEntry>,
    },
    /// Differences survived the tolerance rules.
    Diff {
        event_type: String,
        entries: Vec<DiffEntry>,
    },
    /// Audited on the legacy side, never emitted by the rewritten path.
    MissingOnRewritten { event_type: String },
    /// Emitted by the rewritten path, never by the legacy one.
    MissingOnLegacy { event_type: String },
}

/// Event types the rewritten path emitted more than once for this task,
/// skipping the exempt type.
#[must_use]
pub fn find_duplicates(group: &TaskGroup, config: &AuditConfig) -> Vec<String> {
    group
        .rewritten()
        .iter()
        .filter(|(event_type, payloads)| {
            payloads.len() > 1 && !config.is_duplicate_exempt(event_type)
        })
        .map(|(event_type, _)| event_type.to_string())
        .collect()
}

/// Compares one task's legacy and rewritten events.
#[derive(Debug, Clone)]
pub struct EventComparator<'a> {
    config: &'a AuditConfig,
    filter: ToleranceFilter,
}

impl<'a> EventComparator<'a> {
    #[must_use]
    pub fn new(config: &'a AuditConfig) -> Self {
        Self {
            config,
            filter: ToleranceFilter::new(config),
        }
    }

    /// Runs the forward (allow-listed, diffed) pass followed by the reverse
    /// (presence only) pass.
    #[must_use]
    pub fn compare_task(&self, group: &TaskGroup) -> Vec<Outcome> {
        let mut outcomes = Vec::new();

        for (event_type, payloads) in group.legacy().iter() {
            if !self.config.is_audited(event_type) {
                continue;
            }
            let Some(legacy) = payloads.first() else {
                continue;
            };
            let Some(rewritten) = group.rewritten().canonical(event_type) else {
                outcomes.push(Outcome::MissingOnRewritten {
                    event_type: event_type.to_string(),
                });
                continue;
            };

            let filtered = self.filter.apply(diff_values(legacy, rewritten));
            if filtered.kept.is_empty() {
                outcomes.push(Outcome::Success {
                    event_type: event_type.to_string(),
                    tolerated: filtered.tolerated,
                });
            } else {
                outcomes.push(Outcome::Diff {
                    event_type: event_type.to_string(),
                    entries: filtered.kept,
                });
            }
        }

        for (event_type, _) in group.rewritten().iter() {
            if !group.legacy().contains(event_type) {
                outcomes.push(Outcome::MissingOnLegacy {
                    event_type: event_type.to_string(),
                });
            }
        }

        outcomes
    }
}

/// Audits one task and feeds every finding to the aggregator.
pub fn audit_task(
    group: &TaskGroup,
    config: &AuditConfig,
    comparator: &EventComparator<'_>,
    report: &mut ReportAggregator,
) {
    let task = group.task_identity();

    for event_type in find_duplicates(group, config) {
        tracing::debug!(task, event_type = %event_type, "duplicate rewritten event");
        report.record_duplicate(task, &event_type);
    }

    for outcome in comparator.compare_task(group) {
        match outcome {
            Outcome::Success {
                event_type,
                tolerated,
            } => report.record_success(task, &event_type, &tolerated),
            Outcome::Diff {
                event_type,
                entries,
            } => {
                tracing::debug!(task, event_type = %event_type, entries = entries.len(), "payload diff");
                report.record_diff(task, &event_type, entries);
            }
            Outcome::MissingOnRewritten { event_type } => {
                report.record_missing_on_rewritten(task, &event_type);
            }
            Outcome::MissingOnLegacy { event_type } => {
                report.record_missing_on_legacy(task, &event_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grouping::TaskGrouper;
    use crate::core::record::{LogRecord, Variant};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn grouper_with(records: &[(Variant, &str, &str, Value)]) -> TaskGrouper {
        let mut grouper = TaskGrouper::new();
        for (variant, task, event_type, extra) in records {
            let mut payload = json!({"taskSid": task, "name": event_type});
            if let (Some(obj), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
                obj.extend(extra.clone());
            }
            grouper
                .ingest(LogRecord {
                    variant: *variant,
                    task_identity: (*task).to_string(),
                    event_type: (*event_type).to_string(),
                    payload,
                })
                .unwrap();
        }
        grouper
    }

    fn run(grouper: &TaskGrouper) -> crate::core::report::AuditResult {
        let config = AuditConfig::default();
        let comparator = EventComparator::new(&config);
        let mut report = ReportAggregator::new();
        for group in grouper.groups() {
            audit_task(group, &config, &comparator, &mut report);
        }
        report.finish()
    }

    #[test]
    fn exempt_type_never_counts_as_duplicate() {
        let mut records = vec![
            (Variant::Rewritten, "WT1", "Reservation Created", json!({})),
            (Variant::Rewritten, "WT1", "Task Wrapup", json!({})),
        ];
        for _ in 0..5 {
            records.push((Variant::Rewritten, "WT1", "Task Updated", json!({})));
        }
        let grouper = grouper_with(&records);

        let config = AuditConfig::default();
        assert!(find_duplicates(grouper.get("WT1").unwrap(), &config).is_empty());
    }

    #[test]
    fn repeated_rewritten_event_is_a_duplicate() {
        let grouper = grouper_with(&[
            (Variant::Rewritten, "WT1", "Reservation Created", json!({})),
            (Variant::Rewritten, "WT1", "Reservation Created", json!({})),
            (Variant::Legacy, "WT1", "Reservation Created", json!({})),
            (Variant::Legacy, "WT1", "Reservation Created", json!({})),
            (Variant::Rewritten, "WT2", "Task Updated", json!({})),
            (Variant::Rewritten, "WT2", "Task Updated", json!({})),
        ]);

        let result = run(&grouper);
        assert_eq!(
            result.failure.duplicates.get("Reservation Created"),
            Some(&vec!["WT1".to_string()])
        );
        assert!(!result.failure.duplicates.contains_key("Task Updated"));
    }

    #[test]
    fn tolerated_differences_are_a_success() {
        let grouper = grouper_with(&[
            (
                Variant::Legacy,
                "WT1",
                "Reservation Created",
                json!({"age": 100, "priority": "low"}),
            ),
            (
                Variant::Rewritten,
                "WT1",
                "Reservation Created",
                json!({"age": 103, "priority": "high"}),
            ),
        ]);

        let result = run(&grouper);
        assert_eq!(result.success.len(), 1);
        assert_eq!(result.success[0].task_identity, "WT1");
        assert_eq!(result.success[0].event_type, "Reservation Created");
        assert_eq!(result.success[0].tolerated_paths, vec!["age", "priority"]);
        assert!(result.failure.diff.is_empty());
    }

    #[test]
    fn large_age_drift_is_reported() {
        let grouper = grouper_with(&[
            (
                Variant::Legacy,
                "WT1",
                "Reservation Created",
                json!({"age": 100, "priority": "low"}),
            ),
            (
                Variant::Rewritten,
                "WT1",
                "Reservation Created",
                json!({"age": 200, "priority": "high"}),
            ),
        ]);

        let result = run(&grouper);
        assert!(result.success.is_empty());
        let age = &result.failure.diff["age"];
        assert_eq!(age.len(), 1);
        assert_eq!(age[0].task_identity, "WT1");
        assert_eq!(age[0].legacy_value, Some(json!(100)));
        assert_eq!(age[0].rewritten_value, Some(json!(200)));
        assert!(!result.failure.diff.contains_key("priority"));
    }

    #[test]
    fn identical_payloads_succeed_without_tolerated_paths() {
        let payload = json!({"attributes": {"skillsNeeded": ["a", "b"], "city": "Lisbon"}});
        let grouper = grouper_with(&[
            (Variant::Legacy, "WT1", "Task Wrapup", payload.clone()),
            (Variant::Rewritten, "WT1", "Task Wrapup", payload),
        ]);

        let result = run(&grouper);
        assert_eq!(result.success.len(), 1);
        assert!(result.success[0].tolerated_paths.is_empty());
    }

    #[test]
    fn missing_counterparts_are_symmetric() {
        let grouper = grouper_with(&[
            (Variant::Legacy, "WT1", "Reservation Accepted", json!({})),
            (Variant::Rewritten, "WT1", "Task Updated", json!({})),
        ]);

        let result = run(&grouper);
        assert_eq!(
            result.failure.missing_flag_on,
            BTreeMap::from([("Reservation Accepted".to_string(), vec!["WT1".to_string()])])
        );
        assert_eq!(
            result.failure.missing_flag_off,
            BTreeMap::from([("Task Updated".to_string(), vec!["WT1".to_string()])])
        );
        assert!(result.success.is_empty());
        assert!(result.failure.diff.is_empty());
    }

    #[test]
    fn unaudited_legacy_only_event_is_ignored() {
        let grouper = grouper_with(&[(Variant::Legacy, "WT1", "Task Updated", json!({}))]);

        let result = run(&grouper);
        assert!(result.failure.missing_flag_on.is_empty());
        assert!(result.failure.missing_flag_off.is_empty());
        assert!(result.success.is_empty());
    }

    #[test]
    fn canonical_payload_is_first_seen() {
        let grouper = grouper_with(&[
            (Variant::Legacy, "WT1", "Task Wrapup", json!({"status": "done"})),
            (Variant::Legacy, "WT1", "Task Wrapup", json!({"status": "other"})),
            (Variant::Rewritten, "WT1", "Task Wrapup", json!({"status": "done"})),
            (Variant::Rewritten, "WT1", "Task Wrapup", json!({"status": "late"})),
        ]);

        let config = AuditConfig::default();
        let outcomes = EventComparator::new(&config).compare_task(grouper.get("WT1").unwrap());
        assert_eq!(
            outcomes,
            vec![Outcome::Success {
                event_type: "Task Wrapup".to_string(),
                tolerated: Vec::new(),
            }]
        );
    }

    #[test]
    fn tasks_are_reported_in_first_seen_order() {
        let grouper = grouper_with(&[
            (Variant::Rewritten, "WT2", "Task Updated", json!({})),
            (Variant::Rewritten, "WT1", "Task Updated", json!({})),
        ]);

        let result = run(&grouper);
        assert_eq!(result.failure.missing_flag_off["Task Updated"], vec!["WT2", "WT1"]);
    }
}
