//! Log record definitions and line parsing.
//!
//! Every captured line is one JSON object emitted by the routing service.
//! Only three things are read from it: the `isIrV2` flag that tells which
//! implementation produced it, and `event.taskSid` / `event.name`. The
//! whole `event` object is kept as an opaque payload for diffing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which implementation produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Flag off: the legacy routing path.
    Legacy,
    /// Flag on: the rewritten routing path.
    Rewritten,
}

impl Variant {
    /// Maps the runtime flag to a variant. Only a literal `true` selects the
    /// rewritten path.
    #[must_use]
    pub const fn from_flag(flag_on: bool) -> Self {
        if flag_on {
            Self::Rewritten
        } else {
            Self::Legacy
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Rewritten => write!(f, "rewritten"),
        }
    }
}

/// A line that could not become a groupable record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("record has no event object")]
    MissingEvent,
    #[error("missing task sid (event {event_type:?})")]
    MissingTaskIdentity { event_type: String },
    #[error("missing event name (task {task_identity:?})")]
    MissingEventType { task_identity: String },
}

/// One parsed log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub variant: Variant,
    /// Empty when the line carried no usable `taskSid`.
    pub task_identity: String,
    pub event_type: String,
    pub payload: Value,
}

#[derive(Deserialize)]
struct WireRecord {
    #[serde(rename = "isIrV2", default)]
    flag: Value,
    #[serde(default)]
    event: Value,
}

impl LogRecord {
    /// Parses one raw line.
    ///
    /// Returns `Ok(None)` for a blank line. Malformed JSON and lines without
    /// an `event` object fail; a missing task sid does not, it is left empty
    /// for the grouper to reject.
    ///
    /// # Errors
    /// Returns [`RecordError::Malformed`], [`RecordError::MissingEvent`] or
    /// [`RecordError::MissingEventType`].
    pub fn parse_line(line: &str) -> Result<Option<Self>, RecordError> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let wire: WireRecord = serde_json::from_str(line)?;
        let Value::Object(event) = wire.event else {
            return Err(RecordError::MissingEvent);
        };

        let task_identity = task_identity(&event);

        let Some(event_type) = event.get("name").and_then(Value::as_str).map(str::to_string)
        else {
            return Err(RecordError::MissingEventType { task_identity });
        };

        Ok(Some(Self {
            variant: Variant::from_flag(wire.flag == Value::Bool(true)),
            task_identity,
            event_type,
            payload: Value::Object(event),
        }))
    }
}

/// `taskSid` as a grouping key. Non-zero numeric ids are stringified; an
/// absent, zero, empty or non-scalar sid yields an empty key.
fn task_identity(event: &Map<String, Value>) -> String {
    match event.get("taskSid") {
        Some(Value::String(sid)) => sid.clone(),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v.abs() > 0.0) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_lines_parse_to_none() {
        assert!(LogRecord::parse_line("").unwrap().is_none());
        assert!(LogRecord::parse_line("   \t").unwrap().is_none());
    }

    #[test]
    fn parses_rewritten_record() {
        let line = json!({
            "isIrV2": true,
            "level": "info",
            "event": {"taskSid": "WT1", "name": "Reservation Created", "age": 3}
        })
        .to_string();

        let record = LogRecord::parse_line(&line).unwrap().unwrap();
        assert_eq!(record.variant, Variant::Rewritten);
        assert_eq!(record.task_identity, "WT1");
        assert_eq!(record.event_type, "Reservation Created");
        assert_eq!(record.payload["age"], json!(3));
    }

    #[test]
    fn absent_or_non_true_flag_is_legacy() {
        let absent = json!({"event": {"taskSid": "WT1", "name": "Task Wrapup"}}).to_string();
        let falsy = json!({"isIrV2": "yes", "event": {"taskSid": "WT1", "name": "Task Wrapup"}})
            .to_string();

        for line in [absent, falsy] {
            let record = LogRecord::parse_line(&line).unwrap().unwrap();
            assert_eq!(record.variant, Variant::Legacy);
        }
    }

    #[test]
    fn missing_task_sid_parses_with_empty_identity() {
        let line = json!({"isIrV2": false, "event": {"name": "Task Wrapup"}}).to_string();
        let record = LogRecord::parse_line(&line).unwrap().unwrap();
        assert!(record.task_identity.is_empty());
    }

    #[test]
    fn numeric_task_sid_is_stringified() {
        let line = json!({"event": {"taskSid": 123, "name": "Task Wrapup"}}).to_string();
        let record = LogRecord::parse_line(&line).unwrap().unwrap();
        assert_eq!(record.task_identity, "123");

        for sid in [json!(0), json!(true), json!(null), json!(""), json!({"id": 1})] {
            let line = json!({"event": {"taskSid": sid, "name": "Task Wrapup"}}).to_string();
            let record = LogRecord::parse_line(&line).unwrap().unwrap();
            assert!(record.task_identity.is_empty(), "{sid}");
        }
    }

    #[test]
    fn malformed_json_fails() {
        let err = LogRecord::parse_line("{not json").unwrap_err();
        assert!(matches!(err, RecordError::Malformed(_)));
    }

    #[test]
    fn missing_event_object_fails() {
        let err = LogRecord::parse_line(r#"{"isIrV2": true}"#).unwrap_err();
        assert!(matches!(err, RecordError::MissingEvent));

        let err = LogRecord::parse_line(r#"{"event": "text"}"#).unwrap_err();
        assert!(matches!(err, RecordError::MissingEvent));
    }

    #[test]
    fn missing_event_name_fails() {
        let line = json!({"event": {"taskSid": "WT9"}}).to_string();
        match LogRecord::parse_line(&line).unwrap_err() {
            RecordError::MissingEventType { task_identity } => assert_eq!(task_identity, "WT9"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
