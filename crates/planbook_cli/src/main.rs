//! `planbook` command-line entry point.
//!
//! # Responsibility
//! - Run the integrity engine against a store file and print the report.
//! - Map the verdict to a process exit code.
//!
//! # Invariants
//! - Exit 0 when the store is valid, 1 when it is not, 2 on usage, store or
//!   control failures.
//! - Report lines go to stdout; diagnostics go to stderr.

use clap::{Parser, Subcommand};
use log::info;
use planbook_core::{
    core_version, default_log_level, init_logging, open_db_existing, CheckContext,
    IntegrityChecker, IntegrityOptions, IntegrityResult, LogLevel,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

const EXIT_INVALID: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "planbook")]
#[command(about = "Integrity checks for planbook project stores")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check references and hierarchies in a store
    Check(CheckArgs),
    /// Print the core version
    Version,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Path to the store file
    db_path: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Treat activity parents as dependency edges during cycle detection
    #[arg(long)]
    fold_parents: bool,

    /// Abort the check after this many milliseconds
    #[arg(long, value_name = "N")]
    timeout_ms: Option<u64>,

    /// Write rolling logs to this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, value_name = "L", value_parser = parse_log_level)]
    log_level: Option<LogLevel>,
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    value.parse().map_err(|err: planbook_core::LoggingError| err.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Version => {
            println!("planbook {}", core_version());
            ExitCode::SUCCESS
        }
    }
}

fn run_check(args: &CheckArgs) -> ExitCode {
    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.unwrap_or_else(default_log_level);
        if let Err(err) = init_logging(level, &absolute_dir(log_dir)) {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    let conn = match open_db_existing(&args.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("error: cannot open `{}`: {err}", args.db_path.display());
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let mut checker = match IntegrityChecker::with_store(&conn) {
        Ok(checker) => checker,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    checker.set_options(IntegrityOptions {
        fold_activity_parent_edges: args.fold_parents,
    });

    let ctx = match args.timeout_ms {
        Some(ms) => CheckContext::with_timeout(Duration::from_millis(ms)),
        None => CheckContext::background(),
    };
    let result = match checker.check_all(&ctx) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    info!(
        "event=cli_check module=cli status=ok valid={} path={}",
        result.valid,
        args.db_path.display()
    );

    if let Err(err) = print_report(&result, args.json) {
        eprintln!("error: {err}");
        return ExitCode::from(EXIT_FAILURE);
    }
    if result.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_INVALID)
    }
}

fn print_report(result: &IntegrityResult, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for line in result.lines() {
        println!("{line}");
    }
    eprintln!(
        "valid={} reference_errors={} cycle_errors={} warnings={}",
        result.valid,
        result.reference_errors.len(),
        result.cycle_errors.len(),
        result.warnings.len()
    );
    Ok(())
}

// Logging only accepts absolute directories.
fn absolute_dir(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
