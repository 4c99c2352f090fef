//! Rendering of command summaries and failures.
//!
//! Every command ends in a [`Summary`]. In table mode that is a headline and
//! a metric table; in JSON or YAML mode the same data sits inside a
//! `{success, data}` envelope, and failures fill the envelope's `error` side.
//! All writers are passed in and every I/O error is returned, so the binary
//! decides what a closed pipe means.

use crate::core::capture::CaptureStats;
use crate::core::config::AuditConfig;
use crate::core::error::{AuditError, ErrorCategory, ExitCode};
use crate::core::report::ResultCounts;
use crate::core::runner::AuditRun;
use comfy_table::Table;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Output format for command summaries. The audit report itself is always
/// JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Headline plus metric table.
    #[default]
    Table,
    /// JSON envelope.
    Json,
    /// YAML envelope.
    Yaml,
}

/// What a command reports once it is done.
pub trait Summary: Serialize {
    /// Line printed above the table.
    fn headline(&self) -> String;

    /// `(metric, value)` rows. An empty list prints only the headline.
    fn metrics(&self) -> Vec<(&'static str, String)>;
}

/// Summary of one `audit` run: where the report went, ingest stats, and
/// per-section counts.
#[derive(Debug, Serialize)]
pub struct AuditSummary<'a> {
    #[serde(flatten)]
    pub run: &'a AuditRun,
    pub report: String,
    pub counts: ResultCounts,
}

impl<'a> AuditSummary<'a> {
    #[must_use]
    pub fn new(run: &'a AuditRun, report: String) -> Self {
        Self {
            run,
            report,
            counts: run.counts(),
        }
    }
}

impl Summary for AuditSummary<'_> {
    fn headline(&self) -> String {
        format!("Audit results have been written to {}", self.report)
    }

    fn metrics(&self) -> Vec<(&'static str, String)> {
        let ingest = &self.run.ingest;
        let counts = &self.counts;
        [
            ("lines read", ingest.lines_read),
            ("records grouped", ingest.records_grouped),
            ("lines skipped", ingest.skipped()),
            ("tasks", self.run.tasks),
            ("success", counts.success),
            ("  with tolerated diffs", counts.tolerated_success),
            ("diff (task/event pairs)", counts.diff_pairs),
            ("diff (field entries)", counts.diff_entries),
            ("duplicates", counts.duplicates),
            ("missing on rewritten", counts.missing_on_rewritten),
            ("missing on legacy", counts.missing_on_legacy),
        ]
        .into_iter()
        .map(|(metric, count)| (metric, count.to_string()))
        .collect()
    }
}

/// Summary of one `capture` pass written to a file.
#[derive(Debug, Serialize)]
pub struct CaptureSummary {
    pub output: String,
    #[serde(flatten)]
    pub stats: CaptureStats,
}

impl Summary for CaptureSummary {
    fn headline(&self) -> String {
        format!("Captured lines have been written to {}", self.output)
    }

    fn metrics(&self) -> Vec<(&'static str, String)> {
        [
            ("lines read", self.stats.lines_read),
            ("kept", self.stats.kept),
            ("dropped", self.stats.dropped),
            ("unparseable", self.stats.unparseable),
        ]
        .into_iter()
        .map(|(metric, count)| (metric, count.to_string()))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl VersionInfo {
    #[must_use]
    pub const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Summary for VersionInfo {
    fn headline(&self) -> String {
        format!("{} {}", self.name, self.version)
    }

    fn metrics(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a, T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    category: ErrorCategory,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    context: BTreeMap<&'a str, &'a str>,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    const fn data(data: &'a T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<'a> Envelope<'a, ()> {
    fn error(err: &'a AuditError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                category: err.category,
                code: &err.code,
                message: &err.message,
                hint: err.recovery_hint.as_deref(),
                context: err
                    .context
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect(),
            }),
        }
    }
}

/// Writes a command summary.
///
/// # Errors
/// Returns the underlying I/O error, or a serialization failure wrapped as
/// one.
pub fn write_summary<S: Summary>(
    out: &mut dyn Write,
    summary: &S,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(out, "{}", summary.headline())?;
            let rows = summary.metrics();
            if !rows.is_empty() {
                writeln!(out, "{}", metric_table(&rows))?;
            }
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            write_envelope(out, &Envelope::data(summary), format)
        }
    }
}

/// Writes the effective configuration. Table mode prints the bare YAML so it
/// can be saved and edited as a config file.
///
/// # Errors
/// As [`write_summary`].
pub fn write_config(
    out: &mut dyn Write,
    config: &AuditConfig,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => out.write_all(to_yaml(config)?.as_bytes()),
        OutputFormat::Json | OutputFormat::Yaml => {
            write_envelope(out, &Envelope::data(config), format)
        }
    }
}

/// Writes a failure.
///
/// # Errors
/// As [`write_summary`].
pub fn write_error(out: &mut dyn Write, err: &AuditError, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(out, "Error: {err}")?;
            if let Some(hint) = &err.recovery_hint {
                writeln!(out, "Hint: {hint}")?;
            }
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            write_envelope(out, &Envelope::error(err), format)
        }
    }
}

/// Missing inputs (log capture or named config file) exit with
/// [`ExitCode::NotFound`]; everything else is a plain error.
#[must_use]
pub fn exit_code(err: &AuditError) -> ExitCode {
    match err.category {
        ErrorCategory::Source | ErrorCategory::Config if err.code.ends_with("not_found") => {
            ExitCode::NotFound
        }
        _ => ExitCode::Error,
    }
}

fn write_envelope<T: Serialize>(
    out: &mut dyn Write,
    envelope: &Envelope<'_, T>,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, envelope)?;
            writeln!(out)
        }
        OutputFormat::Yaml | OutputFormat::Table => out.write_all(to_yaml(envelope)?.as_bytes()),
    }
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> io::Result<String> {
    serde_yaml::to_string(value).map_err(io::Error::other)
}

fn metric_table(rows: &[(&'static str, String)]) -> Table {
    let mut table = Table::new();
    table.set_header(["metric", "value"]);
    for (metric, value) in rows {
        table.add_row([*metric, value.as_str()]);
    }
    table
}
