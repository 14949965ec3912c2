//! Data value representation for parsed response bodies.
//!
//! This module provides the tagged tree that every other part of respdiff
//! works on. A decoded response body (JSON, YAML, JSONL) becomes a
//! `DataValue`: a keyed map, a sequence, or a scalar. Locations inside the
//! tree are addressed with `PathKey`s, one per level.
//!
//! # Example
//!
//! ```
//! use respdiff::document::node::{DataValue, PathKey, Scalar};
//! use indexmap::IndexMap;
//!
//! let mut user = IndexMap::new();
//! user.insert("name".to_string(), DataValue::from("Alice"));
//! user.insert("tags".to_string(), DataValue::Seq(vec![DataValue::from("admin")]));
//! let root = DataValue::Map(user);
//!
//! let keys = [PathKey::from("tags"), PathKey::Index(0)];
//! assert_eq!(
//!     root.get_path(&keys),
//!     Some(&DataValue::Scalar(Scalar::String("admin".to_string())))
//! );
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Scalar {
    /// Writes the string form used when matching and capturing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            // Same digits as the JSON body, so `1.0` stays `1.0`.
            Scalar::Float(fl) => match serde_json::Number::from_f64(*fl) {
                Some(n) => write!(f, "{}", n),
                None => write!(f, "{}", fl),
            },
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

/// A parsed data value: keyed map, sequence, or scalar.
///
/// Map key order is kept as parsed, but nothing in the path engine relies on
/// it. Only sequence order is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataValue {
    /// Keyed map with unique string keys
    Map(IndexMap<String, DataValue>),
    /// Ordered, index-addressable sequence
    Seq(Vec<DataValue>),
    /// String, number, boolean or null
    Scalar(Scalar),
}

impl DataValue {
    /// Returns `true` for maps and sequences.
    pub fn is_container(&self) -> bool {
        matches!(self, DataValue::Map(_) | DataValue::Seq(_))
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DataValue::Map(_) => "map",
            DataValue::Seq(_) => "sequence",
            DataValue::Scalar(Scalar::Null) => "null",
            DataValue::Scalar(Scalar::Bool(_)) => "boolean",
            DataValue::Scalar(Scalar::Integer(_)) | DataValue::Scalar(Scalar::Float(_)) => {
                "number"
            }
            DataValue::Scalar(Scalar::String(_)) => "string",
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, DataValue>> {
        match self {
            DataValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[DataValue]> {
        match self {
            DataValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a direct child by key.
    ///
    /// Sequences accept both `PathKey::Index` and a `PathKey::Name` holding a
    /// decimal index; maps accept both and compare against the key's string form.
    pub fn get(&self, key: &PathKey) -> Option<&DataValue> {
        match self {
            DataValue::Map(map) => match key {
                PathKey::Name(name) => map.get(name),
                PathKey::Index(idx) => map.get(&idx.to_string()),
            },
            DataValue::Seq(items) => key.as_index().and_then(|idx| items.get(idx)),
            DataValue::Scalar(_) => None,
        }
    }

    /// Follows `keys` from this value, returning the value found at the end.
    pub fn get_path(&self, keys: &[PathKey]) -> Option<&DataValue> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }
}

impl fmt::Display for DataValue {
    /// Scalars print their plain string form; containers print compact JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Scalar(s) => write!(f, "{}", s),
            _ => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<Scalar> for DataValue {
    fn from(s: Scalar) -> Self {
        DataValue::Scalar(s)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Scalar(Scalar::String(s))
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        DataValue::Scalar(Scalar::Integer(i))
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Scalar(Scalar::Bool(b))
    }
}

/// One step of an address inside a `DataValue`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathKey {
    /// Position inside a sequence
    Index(usize),
    /// Key inside a map
    Name(String),
}

impl PathKey {
    /// Returns the index this key addresses in a sequence, if any.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathKey::Index(idx) => Some(*idx),
            PathKey::Name(name) => parse_index(name),
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Index(idx) => write!(f, "{}", idx),
            PathKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for PathKey {
    fn from(idx: usize) -> Self {
        PathKey::Index(idx)
    }
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::Name(name.to_string())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        PathKey::Name(name)
    }
}

/// Parses a plain decimal index (`"0"`, `"12"`). Signs and blanks are rejected.
pub fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
