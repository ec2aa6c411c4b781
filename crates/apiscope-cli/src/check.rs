//! # Check Subcommand
//!
//! Runs one hygiene check and prints the report to stdout.
//!
//! Everything the run can observe, including a bad `--config` file, is
//! rendered through the same report so CI sees a single `ERROR:` line and
//! a distinct exit code. Only failures to write the report itself escape
//! as `anyhow` errors.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;

use apiscope_schema::{
    aggregate, check_contract, today_utc, CheckError, CheckRequest, PolicyConfig, Report,
};

/// Arguments for the `apiscope check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Contract document (YAML or JSON).
    #[arg(value_name = "CONTRACT")]
    pub contract: PathBuf,

    /// Exemption registry (`.json` parsed as JSON, anything else as YAML).
    #[arg(value_name = "EXEMPTIONS")]
    pub exemptions: Option<PathBuf>,

    /// Judge exemption expiry as of this date (YYYY-MM-DD) instead of today (UTC).
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,
}

/// Execute the check subcommand.
///
/// Returns the exit code of the report.
pub fn run_check(args: &CheckArgs, config: Option<&Path>) -> Result<u8> {
    let report = build_report(args, config);
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(report.text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write report to stdout")?;
    Ok(report.status.code())
}

/// Run the check and render its report without printing it.
pub fn build_report(args: &CheckArgs, config: Option<&Path>) -> Report {
    let policy = match config {
        Some(path) => match PolicyConfig::from_file(path) {
            Ok(policy) => {
                tracing::debug!(path = %path.display(), "loaded policy config");
                policy
            }
            Err(e) => return aggregate(&Err(CheckError::from(e))),
        },
        None => PolicyConfig::default(),
    };

    let today = args.as_of.unwrap_or_else(today_utc);
    tracing::debug!(%today, "judging exemption expiry");

    let outcome = check_contract(&CheckRequest {
        contract: &args.contract,
        exemptions: args.exemptions.as_deref(),
        today,
        config: &policy,
    });
    let report = aggregate(&outcome);
    tracing::info!(status = report.status.code(), "check finished");
    report
}
