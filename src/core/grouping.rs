//! Task grouping index.
//!
//! Records are indexed `task → variant → event type → [payload]`. Every level
//! keeps first-seen order, so iteration over tasks and over event types within
//! a variant matches the order the lines arrived in.

use crate::core::record::{LogRecord, RecordError, Variant};
use serde_json::Value;
use std::collections::HashMap;

/// Payloads of one variant, bucketed by event type in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct VariantEvents {
    buckets: Vec<(String, Vec<Value>)>,
    index: HashMap<String, usize>,
}

impl VariantEvents {
    fn push(&mut self, event_type: String, payload: Value) {
        if let Some(&slot) = self.index.get(&event_type) {
            self.buckets[slot].1.push(payload);
            return;
        }
        self.index.insert(event_type.clone(), self.buckets.len());
        self.buckets.push((event_type, vec![payload]));
    }

    /// All payloads of an event type, in arrival order.
    #[must_use]
    pub fn get(&self, event_type: &str) -> Option<&[Value]> {
        self.index
            .get(event_type)
            .map(|&slot| self.buckets[slot].1.as_slice())
    }

    /// The canonical (first-seen) payload of an event type.
    #[must_use]
    pub fn canonical(&self, event_type: &str) -> Option<&Value> {
        self.get(event_type).and_then(<[Value]>::first)
    }

    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.index.contains_key(event_type)
    }

    /// Iterates buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.buckets
            .iter()
            .map(|(name, payloads)| (name.as_str(), payloads.as_slice()))
    }
}

/// Every observed event for one task, split by variant.
#[derive(Debug, Clone)]
pub struct TaskGroup {
    task_identity: String,
    legacy: VariantEvents,
    rewritten: VariantEvents,
}

impl TaskGroup {
    fn new(task_identity: String) -> Self {
        Self {
            task_identity,
            legacy: VariantEvents::default(),
            rewritten: VariantEvents::default(),
        }
    }

    #[must_use]
    pub fn task_identity(&self) -> &str {
        &self.task_identity
    }

    #[must_use]
    pub const fn legacy(&self) -> &VariantEvents {
        &self.legacy
    }

    #[must_use]
    pub const fn rewritten(&self) -> &VariantEvents {
        &self.rewritten
    }

    fn variant_mut(&mut self, variant: Variant) -> &mut VariantEvents {
        match variant {
            Variant::Legacy => &mut self.legacy,
            Variant::Rewritten => &mut self.rewritten,
        }
    }
}

/// Builds the grouping index from parsed records.
#[derive(Debug, Default)]
pub struct TaskGrouper {
    groups: Vec<TaskGroup>,
    index: HashMap<String, usize>,
}

impl TaskGrouper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to its `(task, variant, event type)` bucket.
    ///
    /// # Errors
    /// Returns [`RecordError::MissingTaskIdentity`] when the record has an
    /// empty task identity; the record is dropped.
    pub fn ingest(&mut self, record: LogRecord) -> Result<(), RecordError> {
        if record.task_identity.is_empty() {
            return Err(RecordError::MissingTaskIdentity {
                event_type: record.event_type,
            });
        }

        let slot = match self.index.get(&record.task_identity) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.index.insert(record.task_identity.clone(), slot);
                self.groups.push(TaskGroup::new(record.task_identity));
                slot
            }
        };

        self.groups[slot]
            .variant_mut(record.variant)
            .push(record.event_type, record.payload);
        Ok(())
    }

    /// Task groups in order of each task's first record.
    #[must_use]
    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    #[must_use]
    pub fn get(&self, task_identity: &str) -> Option<&TaskGroup> {
        self.index.get(task_identity).map(|&slot| &self.groups[slot])
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.groups.len()
    }
}
