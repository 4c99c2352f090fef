//! `ReportSink` trait and implementations.
//!
//! The audit result is written once, in full, when the run completes.

use crate::core::error::AuditError;
use crate::core::report::AuditResult;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Errors that can occur while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportSinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ReportSinkError> for AuditError {
    fn from(err: ReportSinkError) -> Self {
        match &err {
            ReportSinkError::Io(_) => {
                AuditError::sink("report_write_failed", err.to_string(), "storage:report_sink")
            }
            ReportSinkError::Serialization(_) => AuditError::system(
                "report_serialize_failed",
                err.to_string(),
                "storage:report_sink",
            ),
        }
    }
}

/// Result type for report sink operations.
pub type Result<T> = std::result::Result<T, ReportSinkError>;

/// Destination for a finished audit result.
pub trait ReportSink {
    fn write(&mut self, result: &AuditResult) -> Result<()>;

    /// Human-readable destination, used in the completion notice.
    fn label(&self) -> String;
}

fn encode(result: &AuditResult, pretty: bool) -> Result<Vec<u8>> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(result)?
    } else {
        serde_json::to_vec(result)?
    };
    Ok(bytes)
}

/// Writes the report to a file, replacing any previous one.
#[derive(Debug)]
pub struct FileReportSink {
    path: PathBuf,
    pretty: bool,
}

impl FileReportSink {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            pretty: false,
        }
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl ReportSink for FileReportSink {
    fn write(&mut self, result: &AuditResult) -> Result<()> {
        let bytes = encode(result, self.pretty)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn label(&self) -> String {
        self.path.display().to_string()
    }
}

/// Writes the report to any writer, followed by a newline.
#[derive(Debug)]
pub struct WriterReportSink<W> {
    writer: W,
    label: String,
    pretty: bool,
}

impl<W: Write> WriterReportSink<W> {
    #[must_use]
    pub fn new(writer: W, label: impl Into<String>) -> Self {
        Self {
            writer,
            label: label.into(),
            pretty: false,
        }
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterReportSink<W> {
    fn write(&mut self, result: &AuditResult) -> Result<()> {
        let bytes = encode(result, self.pretty)?;
        self.writer.write_all(&bytes)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::ReportAggregator;

    fn sample() -> AuditResult {
        let mut agg = ReportAggregator::new();
        agg.record_success("WT1", "Task Wrapup", &[]);
        agg.record_duplicate("WT2", "Reservation Created");
        agg.finish()
    }

    #[test]
    fn file_sink_creates_parent_and_writes_compact_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("audit.json");

        let mut sink = FileReportSink::new(path.clone());
        sink.write(&sample()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains('\n'));
        let restored: AuditResult = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored, sample());
    }

    #[test]
    fn file_sink_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        fs::write(&path, "stale").unwrap();

        FileReportSink::new(path.clone())
            .pretty(true)
            .write(&AuditResult::default())
            .unwrap();

        let restored: AuditResult =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, AuditResult::default());
    }

    #[test]
    fn writer_sink_appends_newline() {
        let mut sink = WriterReportSink::new(Vec::new(), "buffer");
        sink.write(&sample()).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.ends_with('\n'));
        assert!(out.contains("\"duplicates\":{\"Reservation Created\":[\"WT2\"]}"));
    }

    #[test]
    fn unwritable_path_is_a_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let err = FileReportSink::new(blocker.join("audit.json"))
            .write(&sample())
            .unwrap_err();
        assert_eq!(AuditError::from(err).code, "report_write_failed");
    }
}
