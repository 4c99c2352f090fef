//! CLI command definitions.

use super::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default capture file the audit reads.
pub const DEFAULT_INPUT: &str = "logs.txt";
/// Default report file the audit writes.
pub const DEFAULT_OUTPUT: &str = "audit-results.output.json";

/// parity-audit - Audit legacy vs rewritten routing parity from captured logs.
#[derive(Parser)]
#[command(name = "parity-audit")]
#[command(
    version,
    about,
    long_about = "Replays captured routing events, groups them per task and per implementation,\nand reports duplicates, missing counterparts and structural payload differences."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Log filter for diagnostics on stderr (e.g. `info`, `parity_audit=debug`)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show version information
    Version,

    /// Audit a captured log window and write the result report
    Audit(AuditArgs),

    /// Filter a raw log export down to the lines an audit needs
    Capture(CaptureArgs),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Clone)]
pub struct AuditArgs {
    /// Captured log lines (`-` for stdin)
    #[arg(long, short = 'i', default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Where to write the audit result (`-` for stdout)
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// YAML config overriding the built-in allow-list and tolerances
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Pretty-print the result JSON
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Raw log export (`-` for stdin)
    #[arg(long, short = 'i', default_value = "-")]
    pub input: PathBuf,

    /// Where to write the kept lines (`-` for stdout)
    #[arg(long, short = 'o', default_value = DEFAULT_INPUT)]
    pub output: PathBuf,

    /// YAML config overriding the built-in allow-list
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigShowArgs {
    /// Config file to load instead of the default resolution
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

/// Whether a path argument means stdin/stdout.
#[must_use]
pub fn is_stdio(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}
