//! `LineSource` trait and implementations.
//!
//! A line source hands out captured log lines in arrival order, once each.
//! Where the lines come from (an exported archive, a pipe from the capture
//! job) does not matter to the audit.

use crate::core::error::AuditError;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Errors that can occur while reading lines.
#[derive(Debug, thiserror::Error)]
pub enum LineSourceError {
    #[error("input not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<LineSourceError> for AuditError {
    fn from(err: LineSourceError) -> Self {
        match &err {
            LineSourceError::NotFound(path) => AuditError::source(
                "input_not_found",
                err.to_string(),
                "storage:line_source",
            )
            .with_context("path", path.display().to_string())
            .with_hint("Capture logs first, or pass --input <path>"),
            LineSourceError::Open { path, .. } => {
                AuditError::source("input_open_failed", err.to_string(), "storage:line_source")
                    .with_context("path", path.display().to_string())
            }
            LineSourceError::Io(_) => {
                AuditError::source("input_read_failed", err.to_string(), "storage:line_source")
            }
        }
    }
}

/// Result type for line source operations.
pub type Result<T> = std::result::Result<T, LineSourceError>;

/// Producer of raw text lines.
pub trait LineSource {
    /// Returns the next line without its terminator, or `None` at the end.
    fn next_line(&mut self) -> Result<Option<String>>;

    /// Human-readable origin, used in logs and summaries.
    fn label(&self) -> &str;
}

/// Line source over any buffered reader (file, stdin).
#[derive(Debug)]
pub struct ReaderLineSource<R> {
    reader: R,
    label: String,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderLineSource<R> {
    #[must_use]
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            buf: Vec::new(),
        }
    }
}

impl ReaderLineSource<BufReader<File>> {
    /// Opens a capture file.
    ///
    /// # Errors
    /// Returns [`LineSourceError::NotFound`] or [`LineSourceError::Open`].
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LineSourceError::NotFound(path.to_path_buf())
            } else {
                LineSourceError::Open {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> LineSource for ReaderLineSource<R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// In-memory line source for testing.
#[derive(Debug, Default)]
pub struct MemoryLineSource {
    lines: VecDeque<String>,
}

impl MemoryLineSource {
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for MemoryLineSource {
    fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn label(&self) -> &str {
        "memory"
    }
}
