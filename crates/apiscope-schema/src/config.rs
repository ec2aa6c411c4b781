//! # Policy Configuration
//!
//! Tunables of the hygiene policy, loaded from an optional YAML file.
//! Every field has a default, so an empty file (or no file) yields the
//! standard policy.
//!
//! ```yaml
//! sensitive_keywords: [Playback, Problem, Decision, Trace]
//! schema_ref_prefix: "#/components/schemas/"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::scope::SCHEMA_REF_PREFIX;

/// Schema-name fragments that require `additionalProperties: false`.
pub const DEFAULT_SENSITIVE_KEYWORDS: &[&str] = &["Playback", "Problem", "Decision", "Trace"];

/// Error loading a [`PolicyConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Path to the config file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid.
    #[error("invalid config '{path}': {reason}")]
    Invalid {
        /// Path to the config file.
        path: String,
        /// Parser message.
        reason: String,
    },
}

/// Hygiene policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// A scoped schema whose name contains any of these must be closed.
    pub sensitive_keywords: Vec<String>,
    /// `$ref` values starting with this prefix point into the schema table.
    pub schema_ref_prefix: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sensitive_keywords: DEFAULT_SENSITIVE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            schema_ref_prefix: SCHEMA_REF_PREFIX.to_string(),
        }
    }
}

impl PolicyConfig {
    /// Load from a YAML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Invalid`]
    /// if it does not parse or names an unknown field.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|reason| ConfigError::Invalid {
            path: path.display().to_string(),
            reason,
        })
    }

    /// Parse from YAML text. Blank text yields the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    /// The first sensitive keyword contained in `schema_name`, if any.
    pub fn sensitive_keyword(&self, schema_name: &str) -> Option<&str> {
        self.sensitive_keywords
            .iter()
            .map(String::as_str)
            .find(|k| !k.is_empty() && schema_name.contains(k))
    }
}
