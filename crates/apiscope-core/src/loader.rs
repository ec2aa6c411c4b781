//! # Structural Loader
//!
//! Parses contract text (YAML, or JSON as a YAML subset) into a
//! [`Document`] while rejecting duplicate keys in every mapping at every
//! depth.
//!
//! ## Duplicate Detection
//!
//! `serde_yaml` drives a hand-written visitor. Each mapping keeps its own
//! set of keys; every key is checked against it as soon as the key has been
//! read, before its value is parsed. The first collision aborts the parse.
//!
//! The visitor cannot return structured data through serde's error channel,
//! so the colliding key is recorded in a [`Cell`] owned by the caller of
//! [`load`] and read back once serde has unwound. The parser reports the
//! start of the offending mapping; `locate_duplicate` then finds the line
//! of the second occurrence inside that mapping.
//!
//! ## Tags
//!
//! Only plain YAML is accepted. A value carrying an explicit tag such as
//! `!custom 1` fails as [`LoadError::Syntax`].

use std::cell::Cell;
use std::fmt;
use std::path::Path;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use crate::document::{Document, Mapping, Node, Scalar};
use crate::error::LoadError;

/// Parse `text` into a [`Document`].
///
/// # Errors
///
/// - [`LoadError::DuplicateKey`] if any mapping contains the same key twice.
/// - [`LoadError::Syntax`] for every other parse failure.
pub fn load(text: &str) -> Result<Document, LoadError> {
    let collision = Cell::new(None);
    let deserializer = serde_yaml::Deserializer::from_str(text);

    match (NodeSeed {
        collision: &collision,
    })
    .deserialize(deserializer)
    {
        Ok(root) => Ok(Document::new(root)),
        Err(err) => {
            let location = err.location();
            Err(match collision.take() {
                Some(key) => {
                    let start = location.map(|loc| (loc.line(), loc.column()));
                    let line = locate_duplicate(text, start, &key);
                    LoadError::DuplicateKey { key, line }
                }
                None => LoadError::Syntax {
                    line: location.map(|loc| loc.line()),
                    message: err.to_string(),
                },
            })
        }
    }
}

/// Read the file at `path` and [`load`] it.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, otherwise the
/// errors of [`load`].
pub fn load_file(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load(&text)
}

/// Deserializes one [`Node`], recording the first duplicate key.
#[derive(Clone, Copy)]
struct NodeSeed<'a> {
    collision: &'a Cell<Option<String>>,
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_> {
    type Value = Node;

    fn deserialize<D>(self, deserializer: D) -> Result<Node, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NodeSeed<'_> {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence or mapping")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Int(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        let scalar = i64::try_from(v).map_or(Scalar::Float(v as f64), Scalar::Int);
        Ok(Node::Scalar(scalar))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::Float(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::String(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::Scalar(Scalar::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Node, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        self.deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(self)? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::new();
        while let Some(key) = map.next_key_seed(KeySeed)? {
            if mapping.contains_key(&key) {
                return Err(self.duplicate(key));
            }
            let value = map.next_value_seed(self)?;
            mapping
                .try_insert(key, value)
                .map_err(|(key, _)| self.duplicate::<A::Error>(key))?;
        }
        Ok(Node::Mapping(mapping))
    }
}

impl NodeSeed<'_> {
    fn duplicate<E: de::Error>(&self, key: String) -> E {
        let err = E::custom(format_args!("duplicate key '{key}'"));
        self.collision.set(Some(key));
        err
    }
}

/// Deserializes a mapping key, stringifying non-string scalars.
struct KeySeed;

impl<'de> DeserializeSeed<'de> for KeySeed {
    type Value = String;

    fn deserialize<D>(self, deserializer: D) -> Result<String, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(KeyVisitor)
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok("null".to_owned())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok("null".to_owned())
    }
}

/// Find the 1-based line of the second occurrence of `key` in the mapping
/// that starts at `start` (1-based line and column from the parser).
///
/// Block mappings are scanned line by line at the column of their first
/// key, stopping at the first dedent. Flow mappings are scanned character
/// by character at nesting depth one. Falls back to the mapping's own line.
fn locate_duplicate(text: &str, start: Option<(usize, usize)>, key: &str) -> usize {
    let (line, column) = start.unwrap_or((1, 1));
    let first = line.saturating_sub(1);
    let col = column.saturating_sub(1);
    let lines: Vec<&str> = text.lines().collect();
    let Some(head) = lines.get(first) else {
        return line;
    };

    let found = if head.chars().nth(col) == Some('{') {
        let offset = line_offset(text, first)
            + head.chars().take(col).map(char::len_utf8).sum::<usize>();
        scan_flow(text, offset, key)
    } else {
        scan_block(&lines[first..], col, key).map(|n| first + n + 1)
    };
    found.unwrap_or(line)
}

fn scan_block(lines: &[&str], col: usize, key: &str) -> Option<usize> {
    let mut seen = 0;
    for (n, line) in lines.iter().enumerate() {
        let candidate = if n == 0 {
            match line.char_indices().nth(col) {
                Some((at, _)) => &line[at..],
                None => continue,
            }
        } else {
            let trimmed = line.trim_start_matches(' ');
            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = line.len() - trimmed.len();
            if indent < col {
                break;
            }
            if indent > col {
                continue;
            }
            trimmed
        };
        if key_matches(candidate, key) {
            seen += 1;
            if seen == 2 {
                return Some(n);
            }
        }
    }
    None
}

fn scan_flow(text: &str, start: usize, key: &str) -> Option<usize> {
    let body = &text[start..];
    let mut depth = 0usize;
    let mut expect_key = false;
    let mut seen = 0;
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' | '[' => {
                depth += 1;
                expect_key = c == '{' && depth == 1;
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return None;
                }
                expect_key = false;
            }
            ',' => expect_key = depth == 1,
            c if c.is_whitespace() => {}
            _ => {
                if expect_key && key_matches(&body[i..], key) {
                    seen += 1;
                    if seen == 2 {
                        return Some(line_of(text, start + i));
                    }
                }
                expect_key = false;
                if c == '"' || c == '\'' {
                    skip_quoted(&mut chars, c);
                }
            }
        }
    }
    None
}

fn skip_quoted(chars: &mut std::str::CharIndices<'_>, quote: char) {
    let mut escaped = false;
    for (_, c) in chars.by_ref() {
        if escaped {
            escaped = false;
        } else if quote == '"' && c == '\\' {
            escaped = true;
        } else if c == quote {
            break;
        }
    }
}

/// True if `candidate` starts with `key` (bare or quoted) followed by `:`.
fn key_matches(candidate: &str, key: &str) -> bool {
    let rest = ['"', '\'']
        .iter()
        .find_map(|&q| candidate.strip_prefix(q)?.strip_prefix(key)?.strip_prefix(q))
        .or_else(|| candidate.strip_prefix(key));
    rest.is_some_and(|r| r.trim_start().starts_with(':'))
}

fn line_offset(text: &str, line: usize) -> usize {
    text.split_inclusive('\n').take(line).map(str::len).sum()
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}
