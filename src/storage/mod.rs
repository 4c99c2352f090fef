//! Input and output boundaries of an audit run.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  LineSource  │ ──▶ │  audit core  │ ──▶ │  ReportSink  │
//! │ (file/stdin) │     │  (in memory) │     │ (file/stdout)│
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`line_source`] - Line source trait, reader and in-memory sources
//! - [`report_sink`] - Report sink trait, file and writer sinks

pub mod line_source;
pub mod report_sink;
