//! # apiscope-schema: Contract Hygiene Policy
//!
//! Decides which schemas of an OpenAPI contract are public surface and
//! whether they follow the contract's naming and extensibility policy.
//!
//! ## Scope (`scope`)
//!
//! A schema is in scope when it is reachable from `paths` through `$ref`
//! chains into `components.schemas`. Schemas referenced only from other
//! unreferenced components are internal and never checked. See
//! [`resolve_scope`].
//!
//! ## Rules (`rules`)
//!
//! - **naming**: no `_` in declared property names.
//! - **extensibility**: schemas named after a sensitive keyword must set
//!   `additionalProperties: false`.
//!
//! ## Exemptions (`exemptions`)
//!
//! A registry of named, reasoned, ADR-linked and time-bounded waivers.
//! A malformed or expired entry fails the whole run; there is no partial
//! acceptance.
//!
//! ## Outcome (`report`)
//!
//! [`aggregate`] folds a run into stdout text and an [`ExitStatus`].
//!
//! ## Crate Policy
//!
//! - Depends only on `apiscope-core` internally.
//! - Rules never short-circuit: every violation in scope is reported.
//! - Output order is deterministic and independent of document key order.

pub mod config;
pub mod contract;
pub mod exemptions;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod scope;

pub use config::{ConfigError, PolicyConfig, DEFAULT_SENSITIVE_KEYWORDS};
pub use contract::{Contract, SchemaTable};
pub use exemptions::{
    load_exemptions, parse_exemptions, today_utc, Exemption, ExemptionError, ExemptionSet, Expiry,
};
pub use pipeline::{check_contract, evaluate_document, CheckRequest};
pub use report::{aggregate, CheckError, Evaluation, ExitStatus, Report};
pub use rules::{check_schema, evaluate, RuleId, Violation};
pub use scope::{resolve_scope, resolve_scope_with_prefix, ScopeSet, SCHEMA_REF_PREFIX};
