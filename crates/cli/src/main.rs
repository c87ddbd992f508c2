// RosterAudit CLI - local vs national member roster audit

mod exit_codes;
mod tui;
mod util;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};

use rosteraudit_cli::audit::{run_audit, AuditRequest};
use rosteraudit_cli::render;
use rosteraudit_io::LoadOptions;
use rosteraudit_recon::{fields, ReconError};

use exit_codes::{recon_exit_code, EXIT_FINDINGS, EXIT_SOURCE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "rosteraudit")]
#[command(about = "Audit a local member roster against the national roster")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every national member against the local roster
    #[command(after_help = "\
Examples:
  rosteraudit audit local.xlsx national.csv
  rosteraudit audit local.xlsx national.csv --json > findings.json
  rosteraudit audit local.xlsx national.csv --strict-exit -q
  rosteraudit audit local.csv national.csv --local-header-row 2
  ROSTERAUDIT_LOCAL=local.xlsx ROSTERAUDIT_NATIONAL=national.csv rosteraudit audit")]
    Audit {
        /// Local roster (.xlsx, .xls, .ods, .csv)
        #[arg(env = "ROSTERAUDIT_LOCAL")]
        local: PathBuf,

        /// National roster (.csv, .xlsx, ...)
        #[arg(env = "ROSTERAUDIT_NATIONAL")]
        national: PathBuf,

        /// Print findings as JSON instead of the console transcript
        #[arg(long)]
        json: bool,

        /// Exit 1 when any finding is reported
        #[arg(long)]
        strict_exit: bool,

        /// Suppress progress and summary lines on stderr
        #[arg(long, short = 'q')]
        quiet: bool,

        /// Worksheet to read from a spreadsheet local roster (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// 1-indexed header row of the local roster (default: auto-detect)
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        local_header_row: Option<u64>,

        /// 1-indexed header row of the national roster (default: auto-detect)
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        national_header_row: Option<u64>,
    },

    /// Interactive audit screen
    #[command(after_help = "\
Keys:
  Tab / Shift+Tab   Next/prev field
  Enter             Run audit (on the Audit button)
  Ctrl+R            Run audit from anywhere
  PgUp / PgDn       Scroll output
  Esc / Ctrl+C      Quit")]
    Tui {
        /// Prefill the local roster path
        #[arg(long, env = "ROSTERAUDIT_LOCAL")]
        local: Option<PathBuf>,

        /// Prefill the national roster path
        #[arg(long, env = "ROSTERAUDIT_NATIONAL")]
        national: Option<PathBuf>,

        /// Write logs to this file (logging is off otherwise)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  rosteraudit-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  rosteraudit-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: rosteraudit <command> [options]");
            eprintln!("       rosteraudit --help for more information");
            Err(CliError { code: EXIT_USAGE, message: String::new(), hint: None })
        }
        Some(Commands::Audit {
            local,
            national,
            json,
            strict_exit,
            quiet,
            sheet,
            local_header_row,
            national_header_row,
        }) => {
            init_tracing();
            let request = AuditRequest {
                local,
                national,
                local_options: LoadOptions {
                    sheet,
                    header_row: local_header_row.map(|n| n as usize),
                },
                national_options: LoadOptions {
                    sheet: None,
                    header_row: national_header_row.map(|n| n as usize),
                },
            };
            cmd_audit(request, json, strict_exit, quiet)
        }
        Some(Commands::Tui { local, national, log_file }) => cmd_tui(local, national, log_file),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Log records from the library crates go through the `log` facade; the
/// subscriber's log bridge picks them up. Level comes from RUST_LOG.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init_file_tracing(file: File) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_SOURCE, message: msg.into(), hint: None }
    }

    /// Create error from an engine/loader error with the matching exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingColumn { side, .. } => Some(format!(
                "the {} roster header must name: {}",
                side,
                fields::required_columns(*side).join(", ")
            )),
            ReconError::UnsupportedFormat { .. } => {
                Some("save the roster as .xlsx or .csv".to_string())
            }
            ReconError::EmptySource { .. } | ReconError::Io(_) => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// audit
// ============================================================================

fn cmd_audit(request: AuditRequest, json: bool, strict_exit: bool, quiet: bool) -> Result<(), CliError> {
    let report = run_audit(&request, |stage| {
        if !quiet {
            eprintln!("{}", stage.message());
        }
    })
    .map_err(CliError::recon)?;

    if json {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{}", render::transcript(&report.findings));
    }

    if !quiet {
        eprintln!("{}", render::summary_line(&report.summary));
        eprintln!("{}", render::COMPLETED);
    }

    let s = &report.summary;
    if strict_exit && !s.is_clean() {
        return Err(CliError {
            code: EXIT_FINDINGS,
            message: format!(
                "{} finding(s): {} not found, {} ambiguous, {} field mismatches",
                s.unmatched + s.ambiguous + s.mismatches,
                s.unmatched,
                s.ambiguous,
                s.mismatches,
            ),
            hint: None,
        });
    }

    Ok(())
}

// ============================================================================
// tui
// ============================================================================

fn cmd_tui(local: Option<PathBuf>, national: Option<PathBuf>, log_file: Option<PathBuf>) -> Result<(), CliError> {
    // The alternate screen owns the terminal, so logs only go to a file.
    if let Some(path) = log_file {
        let file = File::create(&path).map_err(|e| {
            CliError::io(format!("cannot create log file {}: {e}", path.display()))
                .with_hint("pass a writable path to --log-file, or omit it")
        })?;
        init_file_tracing(file);
    }

    tui::run(local, national).map_err(CliError::io)
}
