//! Conversion of decoded response bodies into `DataValue` trees.
//!
//! Body decoding itself is done by `serde_json` / `serde_yaml`; this module
//! only maps their value types onto respdiff's tagged tree.
//!
//! # Example
//!
//! ```
//! use respdiff::document::parser::parse_json;
//! use respdiff::document::node::DataValue;
//!
//! let data = parse_json(r#"{"name": "Alice", "age": 30}"#).unwrap();
//! assert_eq!(data.as_map().unwrap().len(), 2);
//!
//! assert!(parse_json(r#"{"unclosed": "#).is_err());
//! ```

use super::node::{DataValue, Scalar};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

/// Parses a JSON document.
pub fn parse_json(json_str: &str) -> Result<DataValue> {
    let value: JsonValue = serde_json::from_str(json_str).context("Failed to parse JSON")?;
    Ok(from_json_value(&value))
}

/// Parses a YAML document.
pub fn parse_yaml(yaml_str: &str) -> Result<DataValue> {
    let value: YamlValue = serde_yaml::from_str(yaml_str).context("Failed to parse YAML")?;
    Ok(from_yaml_value(&value))
}

/// Converts a `serde_json::Value` into a `DataValue`.
pub fn from_json_value(value: &JsonValue) -> DataValue {
    match value {
        JsonValue::Object(map) => DataValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json_value(v)))
                .collect(),
        ),
        JsonValue::Array(items) => DataValue::Seq(items.iter().map(from_json_value).collect()),
        JsonValue::String(s) => DataValue::Scalar(Scalar::String(s.clone())),
        JsonValue::Number(n) => DataValue::Scalar(match n.as_i64() {
            Some(i) => Scalar::Integer(i),
            None => Scalar::Float(n.as_f64().unwrap_or(0.0)),
        }),
        JsonValue::Bool(b) => DataValue::Scalar(Scalar::Bool(*b)),
        JsonValue::Null => DataValue::Scalar(Scalar::Null),
    }
}

/// Converts a `serde_yaml::Value` into a `DataValue`.
///
/// Non-string mapping keys are stringified; tags are dropped.
pub fn from_yaml_value(value: &YamlValue) -> DataValue {
    match value {
        YamlValue::Mapping(mapping) => {
            let mut map = IndexMap::with_capacity(mapping.len());
            for (k, v) in mapping {
                map.insert(yaml_key_text(k), from_yaml_value(v));
            }
            DataValue::Map(map)
        }
        YamlValue::Sequence(items) => DataValue::Seq(items.iter().map(from_yaml_value).collect()),
        YamlValue::String(s) => DataValue::Scalar(Scalar::String(s.clone())),
        YamlValue::Number(n) => DataValue::Scalar(match n.as_i64() {
            Some(i) => Scalar::Integer(i),
            None => Scalar::Float(n.as_f64().unwrap_or(0.0)),
        }),
        YamlValue::Bool(b) => DataValue::Scalar(Scalar::Bool(*b)),
        YamlValue::Null => DataValue::Scalar(Scalar::Null),
        YamlValue::Tagged(tagged) => from_yaml_value(&tagged.value),
    }
}

fn yaml_key_text(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
