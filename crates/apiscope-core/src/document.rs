//! # Document Tree
//!
//! The immutable tree produced by [`load`](crate::load). A contract document
//! is built once per run and only read afterwards.
//!
//! ## Invariants
//!
//! - A [`Mapping`] never holds the same key twice. The only way to add an
//!   entry from outside the crate is [`Mapping::try_insert`], which rejects
//!   collisions.
//! - Mapping iteration follows document order.
//! - Mapping keys are strings. Non-string YAML keys (`200:`, `true:`) are
//!   stringified by the loader.

use std::collections::HashMap;
use std::fmt;

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null`, `~` or an empty value.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// An integer that fits in `i64`.
    Int(i64),
    /// Any other number.
    Float(f64),
    /// A string.
    String(String),
}

impl Scalar {
    /// Borrow the string value, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean value, if this is a boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A leaf value.
    Scalar(Scalar),
    /// An ordered list of nodes.
    Sequence(Vec<Node>),
    /// A mapping from unique string keys to nodes.
    Mapping(Mapping),
}

impl Node {
    /// The null node.
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    /// Borrow the mapping, if this node is one.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the sequence items, if this node is a sequence.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the string value, if this node is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// The boolean value, if this node is a boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(s) => s.as_bool(),
            _ => None,
        }
    }

    /// Look up `key` when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Follow a chain of mapping keys from this node.
    ///
    /// `node.lookup(&["components", "schemas"])` returns the schema table
    /// when every step along the way is a mapping containing the key.
    pub fn lookup(&self, keys: &[&str]) -> Option<&Node> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }
}

/// An insertion-ordered mapping with unique string keys.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, Node)>,
    index: HashMap<String, usize>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// Returns the rejected key and value unchanged if `key` is already
    /// present; the mapping is left untouched.
    pub fn try_insert(&mut self, key: String, value: Node) -> Result<(), (String, Node)> {
        if self.index.contains_key(&key) {
            return Err((key, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate values in document order.
    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.entries.iter().map(|(_, v)| v)
    }
}

// The index is derived from `entries`, so equality only looks at entries.
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// A fully loaded contract document.
///
/// Constructed only by the loader; the tree cannot be mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
}

impl Document {
    pub(crate) fn new(root: Node) -> Self {
        Self { root }
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Consume the document and return its root node.
    pub fn into_root(self) -> Node {
        self.root
    }
}
