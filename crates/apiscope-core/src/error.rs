//! # Error Types: Structural Loading
//!
//! Errors raised while turning contract text into a [`Document`](crate::Document).
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! A duplicate key is reported separately from every other parse failure:
//! it is a governance failure of the contract itself rather than a broken
//! file, and callers map it to its own exit status.

use thiserror::Error;

/// Error produced by the structural loader.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The same key appears twice in one mapping.
    #[error("duplicate key '{key}' found at line {line}")]
    DuplicateKey {
        /// The repeated key, stringified.
        key: String,
        /// 1-based line of the second occurrence.
        line: usize,
    },

    /// The text is not a well-formed YAML (or JSON) document.
    #[error("invalid document: {message}")]
    Syntax {
        /// 1-based line of the failure, when the parser reported one.
        line: Option<usize>,
        /// Parser message.
        message: String,
    },

    /// The document file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
