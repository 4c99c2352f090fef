//! Capture filter for preparing an audit input.
//!
//! Raw exports from the log service contain far more than the audit needs.
//! A line is kept when it parses as a record and either came from the
//! rewritten path or names an audited event type; everything else is
//! dropped. Kept lines are written through unchanged.

use crate::core::config::AuditConfig;
use crate::core::error::{AuditError, Result};
use crate::core::record::{LogRecord, Variant};
use crate::storage::line_source::LineSource;
use serde::Serialize;
use std::io::Write;

/// Counters for one capture pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    pub lines_read: usize,
    pub kept: usize,
    pub dropped: usize,
    pub unparseable: usize,
}

/// Whether a parsed record belongs in an audit input.
#[must_use]
pub fn wanted(record: &LogRecord, config: &AuditConfig) -> bool {
    record.variant == Variant::Rewritten || config.is_audited(&record.event_type)
}

/// Copies wanted lines from `source` to `out`, one per line.
///
/// # Errors
/// Returns a source error if reading fails, or a sink error if writing does.
pub fn capture_lines(
    source: &mut dyn LineSource,
    out: &mut dyn Write,
    config: &AuditConfig,
) -> Result<CaptureStats> {
    let mut stats = CaptureStats::default();

    while let Some(line) = source.next_line()? {
        stats.lines_read += 1;
        match LogRecord::parse_line(&line) {
            Ok(Some(record)) if wanted(&record, config) => {
                writeln!(out, "{line}").map_err(|e| {
                    AuditError::sink(
                        "capture_write_failed",
                        format!("Failed to write captured line: {e}"),
                        "core:capture",
                    )
                })?;
                stats.kept += 1;
            }
            Ok(_) => stats.dropped += 1,
            Err(err) => {
                tracing::debug!(line = stats.lines_read, error = %err, "capture dropped unparseable line");
                stats.unparseable += 1;
            }
        }
    }

    out.flush().map_err(|e| {
        AuditError::sink(
            "capture_write_failed",
            format!("Failed to flush captured lines: {e}"),
            "core:capture",
        )
    })?;
    Ok(stats)
}
