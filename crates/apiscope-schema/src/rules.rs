//! # Hygiene Rules
//!
//! Naming and extensibility policy applied to every scoped, non-exempt
//! schema.
//!
//! ## Rules
//!
//! 1. **`naming`**: property names declared directly under a schema's
//!    `properties` must not contain `_`. Contract fields are camelCase.
//! 2. **`extensibility`**: a schema whose name contains a sensitive
//!    keyword (`Playback`, `Problem`, `Decision`, `Trace` by default) and
//!    that declares at least one property must set
//!    `additionalProperties: false`. An absent value counts as open, as
//!    does any value other than the boolean `false`.
//!
//! Both rules run on every schema without short-circuiting. Violations
//! are accumulated across the whole scope; nothing stops at the first one.

use std::fmt;

use apiscope_core::Node;

use crate::config::PolicyConfig;
use crate::contract::SchemaTable;
use crate::exemptions::ExemptionSet;
use crate::scope::ScopeSet;

/// Identifier of a hygiene rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleId {
    /// Property names must not contain underscores.
    Naming,
    /// Sensitive schemas must be closed with `additionalProperties: false`.
    Extensibility,
}

impl RuleId {
    /// Stable identifier used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::Naming => "naming",
            RuleId::Extensibility => "extensibility",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The offending schema.
    pub schema_name: String,
    /// The rule that fired.
    pub rule_id: RuleId,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule_id, self.message)
    }
}

/// Evaluate every scoped schema, in name order.
///
/// Exempt schemas are skipped entirely; expiry has already been enforced
/// when the exemptions were loaded.
pub fn evaluate(
    scope: &ScopeSet,
    table: &SchemaTable<'_>,
    exemptions: &ExemptionSet,
    config: &PolicyConfig,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for name in scope.iter() {
        if exemptions.contains(name) {
            tracing::debug!(schema = name, "schema exempt; rules skipped");
            continue;
        }
        if let Some(schema) = table.get(name) {
            violations.extend(check_schema(name, schema, config));
        }
    }
    violations
}

/// Apply both rules to one schema definition.
///
/// Naming violations come first, in property declaration order.
pub fn check_schema(name: &str, schema: &Node, config: &PolicyConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_property_naming(name, schema, &mut violations);
    check_extensibility(name, schema, config, &mut violations);
    for v in &violations {
        tracing::debug!(schema = name, rule = %v.rule_id, "{}", v.message);
    }
    violations
}

fn check_property_naming(name: &str, schema: &Node, violations: &mut Vec<Violation>) {
    let Some(properties) = schema.get("properties").and_then(Node::as_mapping) else {
        return;
    };
    for property in properties.keys().filter(|p| p.contains('_')) {
        violations.push(Violation {
            schema_name: name.to_string(),
            rule_id: RuleId::Naming,
            message: format!(
                "Schema '{name}' has property '{property}' with underscores. Use camelCase."
            ),
        });
    }
}

fn check_extensibility(
    name: &str,
    schema: &Node,
    config: &PolicyConfig,
    violations: &mut Vec<Violation>,
) {
    if config.sensitive_keyword(name).is_none() {
        return;
    }
    let declares_properties = schema
        .get("properties")
        .and_then(Node::as_mapping)
        .is_some_and(|p| !p.is_empty());
    if !declares_properties {
        return;
    }
    match schema.get("additionalProperties").and_then(Node::as_bool) {
        Some(false) => {}
        _ => violations.push(Violation {
            schema_name: name.to_string(),
            rule_id: RuleId::Extensibility,
            message: format!("Schema '{name}' is missing 'additionalProperties: false'."),
        }),
    }
}
