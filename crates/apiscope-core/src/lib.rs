//! # apiscope-core: Contract Document Tree
//!
//! Leaf crate of the apiscope workspace. It owns the in-memory
//! representation of a contract document and the structural loader that
//! produces it.
//!
//! ## Key Design Principles
//!
//! 1. **Closed node set.** A [`Node`] is a scalar, a sequence or a mapping.
//!    Every traversal in the workspace is an exhaustive `match` over those
//!    three variants; there is no duck-typed probing of untyped maps.
//!
//! 2. **Unique keys by construction.** A [`Mapping`] can only be built
//!    through the loader, which checks each key against the keys already
//!    placed in the same mapping as the key is produced. A document that
//!    loads successfully therefore contains no duplicate keys at any depth.
//!
//! 3. **No partial documents.** [`load`] either returns the whole tree or a
//!    [`LoadError`]; nothing half-built escapes a failed parse.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `apiscope-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod document;
pub mod error;
pub mod loader;

pub use document::{Document, Mapping, Node, Scalar};
pub use error::LoadError;
pub use loader::{load, load_file};
