//! # Exemption Registry
//!
//! Loads the list of schemas excused from the hygiene rules. Each entry
//! must carry a justification and an architecture-decision link, and is
//! bounded in time by its `expiry`.
//!
//! ```json
//! [
//!   {
//!     "name": "PlaybackState",
//!     "reason": "legacy field names kept for v2 clients",
//!     "adr_link": "docs/adr/0042-legacy-playback.md",
//!     "expiry": "2027-06-30"
//!   }
//! ]
//! ```
//!
//! ## Fail-Fast Loading
//!
//! Unlike the rule engine, the registry stops at the first bad entry and
//! no rule is evaluated. Per entry, required fields are checked before the
//! expiry date.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;

/// Literal `expiry` value for an exemption that never lapses.
pub const EXPIRY_NEVER: &str = "never";

/// Date format of a bounded `expiry`.
pub const EXPIRY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Error loading the exemption registry.
#[derive(Error, Debug)]
pub enum ExemptionError {
    /// An entry lacks a required field or has an unparseable expiry.
    #[error("malformed exemption entry at index {index}{}: {detail}", describe(.name))]
    Malformed {
        /// 0-based position of the entry in the list.
        index: usize,
        /// The entry's name, when it has one.
        name: Option<String>,
        /// What is wrong with the entry.
        detail: String,
    },

    /// An entry's expiry date is before the evaluation date.
    #[error("expired exemption entry for '{name}': {expiry}")]
    Expired {
        /// Exempted schema name.
        name: String,
        /// The expiry exactly as written.
        expiry: String,
    },

    /// The file is not a list of entries.
    #[error("exemption list '{path}' is not a list of entries: {reason}")]
    Parse {
        /// Path to the exemption list.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// The file exists but could not be read.
    #[error("cannot read exemption list '{path}': {source}")]
    Io {
        /// Path to the exemption list.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

fn describe(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" ('{name}')"),
        None => String::new(),
    }
}

/// When an exemption lapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The exemption never lapses.
    Never,
    /// The exemption is honoured up to and including this date.
    On(NaiveDate),
}

impl Expiry {
    /// Parse `"never"` or a `YYYY-MM-DD` date.
    pub fn parse(s: &str) -> Option<Self> {
        if s == EXPIRY_NEVER {
            return Some(Expiry::Never);
        }
        NaiveDate::parse_from_str(s, EXPIRY_DATE_FORMAT)
            .ok()
            .map(Expiry::On)
    }

    /// True if the exemption has lapsed as of `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::On(date) => *date < today,
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Never => f.write_str(EXPIRY_NEVER),
            Expiry::On(date) => write!(f, "{}", date.format(EXPIRY_DATE_FORMAT)),
        }
    }
}

/// A validated, unexpired exemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exemption {
    /// Exempted schema name.
    pub name: String,
    /// Why the schema is exempt.
    pub reason: String,
    /// Link to the architecture decision record.
    pub adr_link: String,
    /// When the exemption lapses.
    pub expiry: Expiry,
}

/// Exemptions keyed by schema name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExemptionSet {
    entries: BTreeMap<String, Exemption>,
}

impl ExemptionSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `name` is exempt.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up the exemption for `name`.
    pub fn get(&self, name: &str) -> Option<&Exemption> {
        self.entries.get(name)
    }

    /// Number of exempted names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is exempt.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exemptions sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Exemption> {
        self.entries.values()
    }

    /// Insert an exemption, replacing any earlier one for the same name.
    ///
    /// Returns the replaced exemption.
    pub fn insert(&mut self, exemption: Exemption) -> Option<Exemption> {
        self.entries.insert(exemption.name.clone(), exemption)
    }
}

/// Today's date in UTC, the default evaluation date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Load the exemption registry.
///
/// - No path: an empty set.
/// - A path that does not exist: an empty set, with a warning.
/// - `.json` files are parsed as JSON, anything else as YAML.
///
/// # Errors
///
/// The first malformed or expired entry, or a read/parse failure.
pub fn load_exemptions(
    path: Option<&Path>,
    today: NaiveDate,
) -> Result<ExemptionSet, ExemptionError> {
    let Some(path) = path else {
        return Ok(ExemptionSet::new());
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                "exemption list not found; continuing without exemptions"
            );
            return Ok(ExemptionSet::new());
        }
        Err(source) => {
            return Err(ExemptionError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(ExemptionSet::new());
    }

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let parsed: Result<Vec<Value>, String> = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };
    let items = parsed.map_err(|reason| ExemptionError::Parse {
        path: path.display().to_string(),
        reason,
    })?;

    let set = parse_exemptions(&items, today)?;
    tracing::info!(path = %path.display(), exemptions = set.len(), "loaded exemption list");
    Ok(set)
}

/// Validate parsed entries into an [`ExemptionSet`].
///
/// A later entry for the same name replaces an earlier one.
///
/// # Errors
///
/// The first entry that is malformed or expired as of `today`.
pub fn parse_exemptions(items: &[Value], today: NaiveDate) -> Result<ExemptionSet, ExemptionError> {
    let mut set = ExemptionSet::new();
    for (index, item) in items.iter().enumerate() {
        let exemption = parse_entry(index, item, today)?;
        if let Some(previous) = set.insert(exemption) {
            tracing::warn!(
                schema = %previous.name,
                index,
                "duplicate exemption entry; the later entry replaces the earlier one"
            );
        }
    }
    Ok(set)
}

fn parse_entry(index: usize, item: &Value, today: NaiveDate) -> Result<Exemption, ExemptionError> {
    if !item.is_object() {
        return Err(ExemptionError::Malformed {
            index,
            name: None,
            detail: "entry is not a mapping".to_string(),
        });
    }

    let name = required_text(index, item, "name", None)?;
    let reason = required_text(index, item, "reason", Some(&name))?;
    let adr_link = required_text(index, item, "adr_link", Some(&name))?;
    let raw_expiry = required_text(index, item, "expiry", Some(&name))?;

    let expiry = Expiry::parse(&raw_expiry).ok_or_else(|| ExemptionError::Malformed {
        index,
        name: Some(name.clone()),
        detail: format!("expiry '{raw_expiry}' is neither \"never\" nor a YYYY-MM-DD date"),
    })?;

    if expiry.is_expired(today) {
        return Err(ExemptionError::Expired {
            name,
            expiry: raw_expiry,
        });
    }

    Ok(Exemption {
        name,
        reason,
        adr_link,
        expiry,
    })
}

fn required_text(
    index: usize,
    item: &Value,
    field: &str,
    name: Option<&str>,
) -> Result<String, ExemptionError> {
    match item.get(field).and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(ExemptionError::Malformed {
            index,
            name: name.map(str::to_string),
            detail: format!("missing or empty '{field}'"),
        }),
    }
}
