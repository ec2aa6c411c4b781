//! # Schema Scope Resolution
//!
//! Computes the set of schema names transitively reachable from the
//! contract's operations.
//!
//! ## Algorithm
//!
//! 1. Every path item under `paths` is scanned recursively for `$ref`
//!    nodes pointing into `components.schemas`. Each target found in the
//!    schema table seeds the scope set.
//! 2. A worklist expands scoped schemas one at a time: a schema's own
//!    definition is scanned for further references, and every target not
//!    yet in scope is added and queued.
//! 3. The loop ends when the worklist is empty.
//!
//! ## Termination
//!
//! A name is queued only when it is inserted into the scope set, and the
//! set never shrinks, so each schema is expanded at most once. The loop
//! therefore runs at most `|components.schemas|` times, cycles included.
//!
//! ## Dangling References
//!
//! A reference to a name absent from the schema table never enters the
//! scope set and never fails the run. Such names are kept apart in
//! [`ScopeSet::unresolved`] and logged.

use std::collections::{BTreeSet, VecDeque};

use apiscope_core::Node;

use crate::contract::{Contract, SchemaTable};

/// JSON pointer prefix of references into the schema table.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Schema names reachable from the contract's operations.
///
/// Iteration is in lexicographic order, independent of the order in
/// which the document was traversed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
    names: BTreeSet<String>,
    unresolved: BTreeSet<String>,
}

impl ScopeSet {
    /// Returns true if `name` is in scope.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of schemas in scope.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no schema is in scope.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Scoped schema names, sorted.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Referenced names that are not defined in the schema table, sorted.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(String::as_str)
    }

    /// Add every defined name in `found`, queueing the ones that are new.
    fn admit(
        &mut self,
        found: BTreeSet<String>,
        table: &SchemaTable<'_>,
        queue: &mut VecDeque<String>,
    ) {
        for name in found {
            if !table.contains(&name) {
                self.unresolved.insert(name);
            } else if self.names.insert(name.clone()) {
                queue.push_back(name);
            }
        }
    }
}

/// Resolve the scope of `contract` using the standard schema prefix.
pub fn resolve_scope(contract: &Contract<'_>) -> ScopeSet {
    resolve_scope_with_prefix(contract, SCHEMA_REF_PREFIX)
}

/// Resolve the scope of `contract`, treating `$ref` values that start with
/// `prefix` as schema references.
pub fn resolve_scope_with_prefix(contract: &Contract<'_>, prefix: &str) -> ScopeSet {
    let table = contract.schemas();
    let mut scope = ScopeSet::default();
    let mut queue = VecDeque::new();

    let mut seeds = BTreeSet::new();
    if let Some(paths) = contract.paths() {
        for path_item in paths.values() {
            collect_schema_refs(path_item, prefix, &mut seeds);
        }
    }
    scope.admit(seeds, &table, &mut queue);

    let mut expansions = 0usize;
    while let Some(name) = queue.pop_front() {
        let Some(schema) = table.get(&name) else {
            continue;
        };
        expansions += 1;
        let mut found = BTreeSet::new();
        collect_schema_refs(schema, prefix, &mut found);
        scope.admit(found, &table, &mut queue);
    }

    for name in scope.unresolved() {
        tracing::warn!(schema = name, "reference to undefined schema ignored");
    }
    tracing::info!(
        scoped = scope.len(),
        table = table.len(),
        expansions,
        "resolved schema scope"
    );
    scope
}

/// Collect the names of all schema references under `node`.
///
/// A mapping with a string `$ref` is a reference node: its target is
/// recorded and its sibling keys are not scanned.
pub fn collect_schema_refs(node: &Node, prefix: &str, out: &mut BTreeSet<String>) {
    match node {
        Node::Scalar(_) => {}
        Node::Sequence(items) => {
            for item in items {
                collect_schema_refs(item, prefix, out);
            }
        }
        Node::Mapping(mapping) => match mapping.get("$ref").and_then(Node::as_str) {
            Some(reference) => {
                if let Some(name) = schema_name(reference, prefix) {
                    out.insert(name);
                }
            }
            None => {
                for value in mapping.values() {
                    collect_schema_refs(value, prefix, out);
                }
            }
        },
    }
}

/// Extract the schema name from a reference such as
/// `#/components/schemas/Widget`.
///
/// The name is the first JSON pointer segment after `prefix`, with `~1`
/// and `~0` unescaped. Returns `None` for other references.
pub fn schema_name(reference: &str, prefix: &str) -> Option<String> {
    let rest = reference.strip_prefix(prefix)?;
    let segment = rest.split('/').next().unwrap_or(rest);
    if segment.is_empty() {
        return None;
    }
    Some(segment.replace("~1", "/").replace("~0", "~"))
}
