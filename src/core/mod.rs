//! Core audit engine: records, grouping, diffing, tolerance and reporting.
//!
//! # Pipeline
//!
//! ```text
//! lines → LogRecord → TaskGrouper → { find_duplicates, EventComparator + ToleranceFilter } → AuditResult
//! ```
//!
//! A run is a single pass over a captured log window. Each line is one JSON
//! record produced by either the legacy routing path or the rewritten one
//! (the `isIrV2` flag). Records are grouped per task and per variant; once
//! the whole window is grouped, every task is audited independently:
//!
//! - rewritten-side event types seen more than once are duplicates (one
//!   chatty event type is exempt);
//! - allow-listed legacy event types are matched against the rewritten side
//!   by first-seen payload and structurally diffed;
//! - differences known to be harmless are removed by the tolerance rules;
//! - event types present on only one side are reported as missing.
//!
//! Findings are data, not errors: they all land in
//! [`AuditResult`](report::AuditResult). Only run-level failures are
//! [`AuditError`](error::AuditError)s.
//!
//! # Modules
//!
//! - [`record`] - Log record parsing and variants
//! - [`grouping`] - Task/variant/event-type index
//! - [`diff`] - Structural payload diff
//! - [`tolerance`] - Field-level tolerance rules
//! - [`audit`] - Duplicate detection and event comparison
//! - [`report`] - Result structure and aggregator
//! - [`runner`] - Run orchestration and ingestion stats
//! - [`capture`] - Pre-audit line filter
//! - [`config`] - Audit configuration
//! - [`error`] - Structured error types

pub mod audit;
pub mod capture;
pub mod config;
pub mod diff;
pub mod error;
pub mod grouping;
pub mod record;
pub mod report;
pub mod runner;
pub mod tolerance;
