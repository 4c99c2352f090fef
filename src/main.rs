//! parity-audit CLI entrypoint.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use parity_audit::cli::commands::{
    is_stdio, AuditArgs, CaptureArgs, Cli, Commands, ConfigCommands, ConfigShowArgs,
};
use parity_audit::cli::output::{
    exit_code, write_config, write_error, write_summary, AuditSummary, CaptureSummary,
    OutputFormat, Summary, VersionInfo,
};
use parity_audit::core::capture::{capture_lines, CaptureStats};
use parity_audit::core::config::AuditConfig;
use parity_audit::core::error::{AuditError, ExitCode, Result};
use parity_audit::core::runner::{run_audit, AuditRun};
use parity_audit::storage::line_source::{LineSource, ReaderLineSource};
use parity_audit::storage::report_sink::{FileReportSink, ReportSink, WriterReportSink};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    let code = match Cli::try_parse_from(&args) {
        Ok(cli) => run(cli),
        Err(err) => handle_clap_error(&err, requested_format(&args)),
    };
    process::exit(i32::from(code));
}

/// `--format` from an argument list clap rejected, so usage errors can
/// still be rendered as JSON or YAML.
fn requested_format(args: &[OsString]) -> OutputFormat {
    Cli::command()
        .ignore_errors(true)
        .try_get_matches_from(args)
        .ok()
        .and_then(|matches| matches.try_get_one::<OutputFormat>("format").ok().flatten().copied())
        .unwrap_or_default()
}

fn handle_clap_error(err: &clap::Error, format: OutputFormat) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            emit(err.print(), ExitCode::Success)
        }
        ErrorKind::DisplayVersion => emit(
            write_summary(&mut io::stdout().lock(), &VersionInfo::current(), format),
            ExitCode::Success,
        ),
        _ if format == OutputFormat::Table => emit(err.print(), ExitCode::Error),
        _ => {
            let rendered = err.to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ");
            let usage = AuditError::user("invalid_arguments", message, "cli:parse")
                .with_hint("Run with --help for usage");
            fail(&usage, format)
        }
    }
}

/// Folds the outcome of writing to the terminal into the exit code. A reader
/// that closed the pipe early is not a failure.
fn emit(written: io::Result<()>, code: ExitCode) -> ExitCode {
    match written {
        Err(err) if err.kind() != io::ErrorKind::BrokenPipe => {
            eprintln!("Failed to write output: {err}");
            ExitCode::Error
        }
        _ => code,
    }
}

fn fail(err: &AuditError, format: OutputFormat) -> ExitCode {
    emit(write_error(&mut io::stderr().lock(), err, format), exit_code(err))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> ExitCode {
    init_logging(&cli.log_level);
    let format = cli.format;

    match cli.command {
        Some(Commands::Version) => emit(
            write_summary(&mut io::stdout().lock(), &VersionInfo::current(), format),
            ExitCode::Success,
        ),
        Some(Commands::Audit(args)) => handle_audit(&args, format),
        Some(Commands::Capture(args)) => handle_capture(&args, format),
        Some(Commands::Config(ConfigCommands::Show(args))) => handle_config_show(&args, format),
        None => emit(Cli::command().print_help(), ExitCode::Success),
    }
}

fn open_source(input: &Path) -> Result<Box<dyn LineSource>> {
    if is_stdio(input) {
        return Ok(Box::new(ReaderLineSource::new(io::stdin().lock(), "stdin")));
    }
    Ok(Box::new(ReaderLineSource::open(input)?))
}

fn open_sink(output: &Path, pretty: bool) -> Box<dyn ReportSink> {
    if is_stdio(output) {
        Box::new(WriterReportSink::new(io::stdout(), "stdout").pretty(pretty))
    } else {
        Box::new(FileReportSink::new(output.to_path_buf()).pretty(pretty))
    }
}

/// Runs the audit and writes the report; returns the run and where it went.
fn audit(args: &AuditArgs) -> Result<(AuditRun, String)> {
    let config = AuditConfig::resolve(args.config.as_deref())?;
    let mut source = open_source(&args.input)?;
    let run = run_audit(source.as_mut(), &config)?;

    let mut sink = open_sink(&args.output, args.pretty);
    sink.write(&run.result)
        .map_err(|e| AuditError::from(e).with_context("report", sink.label()))?;
    Ok((run, sink.label()))
}

fn handle_audit(args: &AuditArgs, format: OutputFormat) -> ExitCode {
    let (run, report) = match audit(args) {
        Ok(done) => done,
        Err(err) => return fail(&err, format),
    };
    let summary = AuditSummary::new(&run, report);

    // stdout already carries the report JSON
    if is_stdio(&args.output) {
        eprintln!("{}", summary.headline());
        return ExitCode::Success;
    }
    emit(
        write_summary(&mut io::stdout().lock(), &summary, format),
        ExitCode::Success,
    )
}

fn capture(args: &CaptureArgs) -> Result<CaptureStats> {
    let config = AuditConfig::resolve(args.config.as_deref())?;
    let mut source = open_source(&args.input)?;

    let mut out: Box<dyn Write> = if is_stdio(&args.output) {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(&args.output).map_err(|e| {
            AuditError::sink(
                "capture_open_failed",
                format!("Failed to create capture output: {e}"),
                "cli:capture",
            )
            .with_context("path", args.output.display().to_string())
        })?;
        Box::new(BufWriter::new(file))
    };

    capture_lines(source.as_mut(), out.as_mut(), &config)
}

fn handle_capture(args: &CaptureArgs, format: OutputFormat) -> ExitCode {
    let stats = match capture(args) {
        Ok(stats) => stats,
        Err(err) => return fail(&err, format),
    };

    if is_stdio(&args.output) {
        eprintln!("Captured {} of {} lines", stats.kept, stats.lines_read);
        return ExitCode::Success;
    }
    let summary = CaptureSummary {
        output: args.output.display().to_string(),
        stats,
    };
    emit(
        write_summary(&mut io::stdout().lock(), &summary, format),
        ExitCode::Success,
    )
}

fn handle_config_show(args: &ConfigShowArgs, format: OutputFormat) -> ExitCode {
    match AuditConfig::resolve(args.config.as_deref()) {
        Ok(config) => emit(
            write_config(&mut io::stdout().lock(), &config, format),
            ExitCode::Success,
        ),
        Err(err) => fail(&err, format),
    }
}
