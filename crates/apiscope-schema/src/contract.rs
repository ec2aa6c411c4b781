//! # Contract View
//!
//! Borrowed view over the two sections of a contract document that the
//! hygiene check reads: `paths` (the published operations) and
//! `components.schemas` (the named schema table).
//!
//! No OpenAPI structure is validated here. A section that is missing, or
//! present but not a mapping, is treated as empty.

use apiscope_core::{Document, Mapping, Node};

/// The `paths` and `components.schemas` sections of a loaded document.
#[derive(Debug, Clone, Copy)]
pub struct Contract<'a> {
    root: &'a Node,
}

impl<'a> Contract<'a> {
    /// Wrap a loaded document.
    pub fn new(document: &'a Document) -> Self {
        Self {
            root: document.root(),
        }
    }

    /// The `paths` mapping, if the document has one.
    pub fn paths(&self) -> Option<&'a Mapping> {
        self.root.get("paths").and_then(Node::as_mapping)
    }

    /// The `components.schemas` table.
    pub fn schemas(&self) -> SchemaTable<'a> {
        SchemaTable {
            schemas: self
                .root
                .lookup(&["components", "schemas"])
                .and_then(Node::as_mapping),
        }
    }
}

/// The named schema table (`components.schemas`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaTable<'a> {
    schemas: Option<&'a Mapping>,
}

impl<'a> SchemaTable<'a> {
    /// Look up a schema definition by name.
    pub fn get(&self, name: &str) -> Option<&'a Node> {
        self.schemas.and_then(|m| m.get(name))
    }

    /// Returns true if `name` is defined in the table.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.is_some_and(|m| m.contains_key(name))
    }

    /// Number of schemas in the table.
    pub fn len(&self) -> usize {
        self.schemas.map_or(0, Mapping::len)
    }

    /// Returns true if the table is empty or absent.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiscope_core::load;

    #[test]
    fn test_sections_present() {
        let doc = load(
            "paths:\n  /a: {}\n  /b: {}\ncomponents:\n  schemas:\n    Widget: {}\n",
        )
        .unwrap();
        let contract = Contract::new(&doc);
        assert_eq!(contract.paths().map(Mapping::len), Some(2));
        let table = contract.schemas();
        assert_eq!(table.len(), 1);
        assert!(table.contains("Widget"));
        assert!(table.get("Widget").is_some());
        assert!(!table.contains("Gadget"));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let doc = load("openapi: 3.0.3\n").unwrap();
        let contract = Contract::new(&doc);
        assert!(contract.paths().is_none());
        assert!(contract.schemas().is_empty());
        assert!(contract.schemas().get("Widget").is_none());
    }

    #[test]
    fn test_non_mapping_sections_are_ignored() {
        let doc = load("paths: [1, 2]\ncomponents:\n  schemas: nope\n").unwrap();
        let contract = Contract::new(&doc);
        assert!(contract.paths().is_none());
        assert!(contract.schemas().is_empty());
    }

    #[test]
    fn test_non_mapping_root() {
        let doc = load("- just\n- a list\n").unwrap();
        let contract = Contract::new(&doc);
        assert!(contract.paths().is_none());
        assert_eq!(contract.schemas().len(), 0);
    }
}
