//! Audit run orchestration.
//!
//! ```text
//! LineSource ─▶ parse ─▶ TaskGrouper ─▶ (per task) duplicates + compare ─▶ ReportAggregator
//! ```
//!
//! Grouping consumes the whole source before any task is compared, since
//! matching needs every record of a task. A bad line is logged, counted and
//! skipped; only failing to read the source aborts the run.

use crate::core::audit::{audit_task, EventComparator};
use crate::core::config::AuditConfig;
use crate::core::error::Result;
use crate::core::grouping::TaskGrouper;
use crate::core::record::{LogRecord, RecordError};
use crate::core::report::{AuditResult, ReportAggregator, ResultCounts};
use crate::storage::line_source::LineSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Informal per-run counters for the ingestion phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub lines_read: usize,
    pub blank_lines: usize,
    pub records_grouped: usize,
    pub malformed_lines: usize,
    pub missing_task_identity: usize,
    pub missing_event_type: usize,
}

impl IngestStats {
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.malformed_lines + self.missing_task_identity + self.missing_event_type
    }

    fn count_skip(&mut self, err: &RecordError) {
        match err {
            RecordError::Malformed(_) | RecordError::MissingEvent => self.malformed_lines += 1,
            RecordError::MissingTaskIdentity { .. } => self.missing_task_identity += 1,
            RecordError::MissingEventType { .. } => self.missing_event_type += 1,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRun {
    pub run_id: Uuid,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub ingest: IngestStats,
    pub tasks: usize,
    #[serde(skip)]
    pub result: AuditResult,
}

impl AuditRun {
    #[must_use]
    pub fn counts(&self) -> ResultCounts {
        ResultCounts::from(&self.result)
    }
}

/// Reads every line from `source` into a grouping index.
///
/// # Errors
/// Returns a source error if reading fails part way; per-line problems are
/// logged and counted instead.
pub fn group_lines(source: &mut dyn LineSource) -> Result<(TaskGrouper, IngestStats)> {
    let mut grouper = TaskGrouper::new();
    let mut stats = IngestStats::default();

    while let Some(line) = source.next_line()? {
        stats.lines_read += 1;
        let line_number = stats.lines_read;

        let ingested = LogRecord::parse_line(&line).and_then(|parsed| match parsed {
            Some(record) => grouper.ingest(record).map(|()| true),
            None => Ok(false),
        });

        match ingested {
            Ok(true) => stats.records_grouped += 1,
            Ok(false) => stats.blank_lines += 1,
            Err(err) => {
                tracing::warn!(line = line_number, error = %err, "skipping log line");
                stats.count_skip(&err);
            }
        }
    }

    Ok((grouper, stats))
}

/// Runs the comparison phase over a completed grouping index.
#[must_use]
pub fn audit_groups(grouper: &TaskGrouper, config: &AuditConfig) -> AuditResult {
    let comparator = EventComparator::new(config);
    let mut report = ReportAggregator::new();
    for group in grouper.groups() {
        audit_task(group, config, &comparator, &mut report);
    }
    report.finish()
}

/// Runs a full audit over `source`.
///
/// # Errors
/// Returns a source error if the line source cannot be read.
pub fn run_audit(source: &mut dyn LineSource, config: &AuditConfig) -> Result<AuditRun> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let label = source.label().to_string();
    tracing::info!(%run_id, source = %label, "audit started");

    let (grouper, ingest) = group_lines(source)?;
    tracing::info!(
        %run_id,
        lines = ingest.lines_read,
        grouped = ingest.records_grouped,
        skipped = ingest.skipped(),
        tasks = grouper.task_count(),
        "grouping complete"
    );

    let result = audit_groups(&grouper, config);
    let run = AuditRun {
        run_id,
        source: label,
        started_at,
        finished_at: Utc::now(),
        ingest,
        tasks: grouper.task_count(),
        result,
    };

    let counts = run.counts();
    tracing::info!(
        %run_id,
        success = counts.success,
        diff_pairs = counts.diff_pairs,
        duplicates = counts.duplicates,
        missing_on_rewritten = counts.missing_on_rewritten,
        missing_on_legacy = counts.missing_on_legacy,
        "audit finished"
    );
    Ok(run)
}
