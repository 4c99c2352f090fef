//! Tolerance rules applied to raw payload diffs.
//!
//! Several fields differ between the two paths for reasons that are not
//! regressions: timing drift, a token in the description that changes on
//! every reservation, fields the rewrite adds on purpose. Each rule keys on
//! the first segment of the diff path; the first rule that matches decides.

use crate::core::config::AuditConfig;
use crate::core::diff::{ChangeKind, DiffEntry};
use chrono::DateTime;
use serde_json::Value;

/// Outcome of running a diff through the rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredDiff {
    /// Entries that still count as regressions.
    pub kept: Vec<DiffEntry>,
    /// Entries a rule suppressed.
    pub tolerated: Vec<DiffEntry>,
}

/// The fixed rule table, parameterized by thresholds from [`AuditConfig`].
#[derive(Debug, Clone)]
pub struct ToleranceFilter {
    age_tolerance: f64,
    created_at_tolerance: f64,
    known_source: String,
}

impl ToleranceFilter {
    #[must_use]
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            age_tolerance: config.age_tolerance,
            created_at_tolerance: config.created_at_tolerance,
            known_source: config.known_source.clone(),
        }
    }

    /// Splits a raw diff into kept and tolerated entries, preserving order.
    #[must_use]
    pub fn apply(&self, entries: Vec<DiffEntry>) -> FilteredDiff {
        let (kept, tolerated) = entries.into_iter().partition(|entry| self.keeps(entry));
        FilteredDiff { kept, tolerated }
    }

    /// Returns only the entries that survive.
    #[must_use]
    pub fn filter(&self, entries: Vec<DiffEntry>) -> Vec<DiffEntry> {
        self.apply(entries).kept
    }

    /// Whether a single entry is still reported.
    #[must_use]
    pub fn keeps(&self, entry: &DiffEntry) -> bool {
        let (Some(field), kind) = (entry.path.first_key(), entry.kind) else {
            return true;
        };

        match (field, kind) {
            ("age", ChangeKind::Changed) => {
                exceeds(entry, numeric_value, self.age_tolerance)
            }
            ("createdAt", ChangeKind::Changed) => {
                exceeds(entry, timestamp_value, self.created_at_tolerance)
            }
            ("description", ChangeKind::Changed) => {
                match (
                    entry.legacy.as_ref().and_then(Value::as_str),
                    entry.rewritten.as_ref().and_then(Value::as_str),
                ) {
                    (Some(legacy), Some(rewritten)) => {
                        without_second_token(legacy) != without_second_token(rewritten)
                    }
                    _ => true,
                }
            }
            ("source", ChangeKind::Added) => {
                entry.rewritten.as_ref().and_then(Value::as_str) != Some(self.known_source.as_str())
            }
            ("email", ChangeKind::Added) | ("priority", ChangeKind::Changed) => false,
            _ => true,
        }
    }
}

/// Keeps the entry only when both sides convert and drift by more than
/// `tolerance`. Without a numeric difference there is nothing to exceed.
fn exceeds(entry: &DiffEntry, convert: fn(&Value) -> Option<f64>, tolerance: f64) -> bool {
    match (
        entry.legacy.as_ref().and_then(convert),
        entry.rewritten.as_ref().and_then(convert),
    ) {
        (Some(legacy), Some(rewritten)) => (legacy - rewritten).abs() > tolerance,
        _ => false,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Epoch numbers pass through; RFC 3339 strings become epoch seconds.
#[allow(clippy::cast_precision_loss)]
fn timestamp_value(value: &Value) -> Option<f64> {
    numeric_value(value).or_else(|| {
        let raw = value.as_str()?;
        let parsed = DateTime::parse_from_rfc3339(raw.trim()).ok()?;
        Some(parsed.timestamp_millis() as f64 / 1000.0)
    })
}

/// Drops the second space-separated token, which varies per reservation.
fn without_second_token(description: &str) -> String {
    description
        .split(' ')
        .enumerate()
        .filter(|(i, _)| *i != 1)
        .map(|(_, token)| token)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diff::diff_values;
    use serde_json::json;

    fn filter() -> ToleranceFilter {
        ToleranceFilter::new(&AuditConfig::default())
    }

    #[test]
    fn small_age_drift_is_tolerated() {
        let entry = DiffEntry::changed("age".into(), json!(100), json!(103));
        assert!(!filter().keeps(&entry));

        let edge = DiffEntry::changed("age".into(), json!(100), json!(105));
        assert!(!filter().keeps(&edge));
    }

    #[test]
    fn large_age_drift_is_kept() {
        let entry = DiffEntry::changed("age".into(), json!(100), json!(200));
        assert!(filter().keeps(&entry));

        let stringly = DiffEntry::changed("age".into(), json!("100"), json!("106"));
        assert!(filter().keeps(&stringly));
    }

    #[test]
    fn unconvertible_age_or_created_at_is_dropped() {
        let age = DiffEntry::changed("age".into(), json!(100), json!("soon"));
        assert!(!filter().keeps(&age));

        let created = DiffEntry::changed("createdAt".into(), json!("yesterday"), json!("today"));
        assert!(!filter().keeps(&created));

        let object = DiffEntry::changed("age".into(), json!({"s": 1}), json!(100));
        assert!(!filter().keeps(&object));
    }

    #[test]
    fn created_at_accepts_epoch_strings_and_rfc3339() {
        let epoch = DiffEntry::changed(
            "createdAt".into(),
            json!("1700000000"),
            json!("1700000004"),
        );
        assert!(!filter().keeps(&epoch));

        let iso = DiffEntry::changed(
            "createdAt".into(),
            json!("2024-05-01T10:00:00Z"),
            json!("2024-05-01T10:00:03.500Z"),
        );
        assert!(!filter().keeps(&iso));

        let far = DiffEntry::changed(
            "createdAt".into(),
            json!("2024-05-01T10:00:00Z"),
            json!("2024-05-01T10:01:00Z"),
        );
        assert!(filter().keeps(&far));
    }

    #[test]
    fn description_ignores_the_second_token() {
        let entry = DiffEntry::changed(
            "description".into(),
            json!("Reservation WR111 created for Ana"),
            json!("Reservation WR999 created for Ana"),
        );
        assert!(!filter().keeps(&entry));

        let real = DiffEntry::changed(
            "description".into(),
            json!("Reservation WR111 created for Ana"),
            json!("Reservation WR111 accepted for Ana"),
        );
        assert!(filter().keeps(&real));
    }

    #[test]
    fn known_source_addition_is_dropped() {
        let known = DiffEntry::added("source".into(), json!("Regal Voice"));
        let other = DiffEntry::added("source".into(), json!("Somewhere Else"));
        let changed = DiffEntry::changed("source".into(), json!("A"), json!("Regal Voice"));

        assert!(!filter().keeps(&known));
        assert!(filter().keeps(&other));
        assert!(filter().keeps(&changed));
    }

    #[test]
    fn email_addition_and_priority_change_are_dropped() {
        assert!(!filter().keeps(&DiffEntry::added("email".into(), json!("a@b.c"))));
        assert!(filter().keeps(&DiffEntry::removed("email".into(), json!("a@b.c"))));
        assert!(!filter().keeps(&DiffEntry::changed(
            "priority".into(),
            json!("low"),
            json!("high")
        )));
        assert!(filter().keeps(&DiffEntry::added("priority".into(), json!("high"))));
    }

    #[test]
    fn rules_match_on_the_first_segment_only() {
        let nested = DiffEntry::changed("attributes.age".into(), json!(1), json!(2));
        assert!(filter().keeps(&nested));

        let deep_priority = DiffEntry::changed(
            "priority.level".into(),
            json!(1),
            json!(9),
        );
        assert!(!filter().keeps(&deep_priority));
    }

    #[test]
    fn filtering_is_idempotent() {
        let legacy = json!({
            "age": 100, "priority": "low", "queueName": "sales",
            "description": "Reservation WR1 created", "createdAt": "10"
        });
        let rewritten = json!({
            "age": 300, "priority": "high", "queueName": "support", "email": "x@y.z",
            "source": "Regal Voice", "description": "Reservation WR2 created", "createdAt": "30"
        });

        let once = filter().filter(diff_values(&legacy, &rewritten));
        let twice = filter().filter(once.clone());
        assert_eq!(once, twice);

        let kept: Vec<_> = once.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(kept, vec!["age", "createdAt", "queueName"]);
    }

    #[test]
    fn apply_reports_tolerated_entries() {
        let entries = vec![
            DiffEntry::changed("age".into(), json!(1), json!(2)),
            DiffEntry::changed("status".into(), json!("a"), json!("b")),
        ];
        let result = filter().apply(entries);
        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.tolerated.len(), 1);
        assert_eq!(result.tolerated[0].path.to_string(), "age");
    }
}
