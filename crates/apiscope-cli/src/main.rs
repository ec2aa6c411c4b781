//! # apiscope CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! The report goes to stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apiscope_cli::check::{run_check, CheckArgs};
use apiscope_cli::ExitStatus;

/// OpenAPI contract hygiene gate.
///
/// Resolves the schemas reachable from a contract's operations and checks
/// them against the naming and extensibility policy, honouring a registry
/// of time-bounded exemptions.
#[derive(Parser, Debug)]
#[command(name = "apiscope", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a policy configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a contract's scoped schemas against the hygiene policy.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(ExitStatus::Operational.code()),
            };
        }
    };

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "apiscope starting");

    let result = match cli.command {
        Commands::Check(args) => run_check(&args, cli.config.as_deref()),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(ExitStatus::Operational.code())
        }
    }
}
