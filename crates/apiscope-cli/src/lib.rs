//! # apiscope-cli: Contract Hygiene Gate
//!
//! Provides the `apiscope` command-line interface used as a CI gate in
//! front of an OpenAPI contract.
//!
//! ## Subcommands
//!
//! - `apiscope check`: load the contract and the exemption registry,
//!   resolve the public schema scope and apply the hygiene rules.
//!
//! ```bash
//! apiscope check openapi.yaml
//! apiscope check openapi.yaml exemptions.json --as-of 2026-01-31
//! apiscope --config apiscope.yaml -v check openapi.yaml exemptions.yaml
//! ```
//!
//! ## Exit Codes
//!
//! The process exit code is the report's status code: `0` clean, `1`
//! violations, `2` malformed exemption, `3` expired exemption, `4`
//! operational failure, `5` duplicate key in the contract.

pub mod check;

pub use apiscope_schema::ExitStatus;
