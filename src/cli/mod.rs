//! CLI commands and argument parsing.
//!
//! The CLI is built on [`clap`](https://docs.rs/clap).
//!
//! # Commands
//!
//! - `audit` - group a captured log window, compare variants, write the report
//! - `capture` - filter a raw export down to audit-relevant lines
//! - `config show` - print the effective configuration
//! - `version` - version info
//!
//! # Output Formats
//!
//! Summaries support `-f table` (default), `-f json` and `-f yaml`. The audit
//! report itself is always JSON. Diagnostics go to stderr through `tracing`,
//! filtered by `--log-level`.
//!
//! # Example
//!
//! ```bash,no_run
//! # Keep only lines the audit cares about
//! parity-audit capture -i export.jsonl -o logs.txt
//!
//! # Audit them
//! parity-audit audit -i logs.txt -o audit-results.output.json
//! ```
//!
//! # Modules
//!
//! - [`commands`] - Command definitions
//! - [`output`] - Output formatting and table rendering

pub mod commands;
pub mod output;
