//! YAML manifest loading using yaml-rust2
//!
//! Manifests are parsed into `serde_json::Value` first and then deserialized
//! into typed resources, so serde defaults on the CRDs apply uniformly.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::{Error, Result};

/// Parse a YAML string into a serde_json::Value.
///
/// For multi-document YAML, returns only the first document.
/// Returns `Value::Null` for empty input.
pub fn parse_yaml(input: &str) -> Result<Value> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::serialization(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Parse a multi-document YAML string, one Value per `---` document
pub fn parse_yaml_multi(input: &str) -> Result<Vec<Value>> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::serialization(e.to_string()))?;
    docs.into_iter().map(yaml_to_json).collect()
}

/// Deserialize a typed resource from a YAML manifest
pub fn from_yaml<T: DeserializeOwned>(input: &str) -> Result<T> {
    let value = parse_yaml(input)?;
    serde_json::from_value(value).map_err(|e| {
        Error::serialization_for_kind(std::any::type_name::<T>(), e.to_string())
    })
}

fn yaml_to_json(yaml: Yaml) -> Result<Value> {
    let value = match yaml {
        Yaml::Null => Value::Null,
        Yaml::Boolean(b) => Value::Bool(b),
        Yaml::Integer(i) => Value::from(i),
        Yaml::Real(raw) => real_to_json(&raw)?,
        Yaml::String(s) => Value::String(s),
        Yaml::Array(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_>>()?,
        ),
        Yaml::Hash(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, value) in entries {
                object.insert(mapping_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Alias(_) | Yaml::BadValue => {
            return Err(Error::serialization("YAML aliases and invalid nodes are not supported"))
        }
    };
    Ok(value)
}

/// YAML floats arrive as their source text; NaN and infinities become null
fn real_to_json(raw: &str) -> Result<Value> {
    let parsed: f64 = raw
        .parse()
        .map_err(|e| Error::serialization(format!("invalid float '{}': {}", raw, e)))?;
    Ok(Number::from_f64(parsed).map_or(Value::Null, Value::Number))
}

/// JSON object keys are strings, so only scalar YAML keys are accepted
fn mapping_key(key: Yaml) -> Result<String> {
    match key {
        Yaml::String(s) | Yaml::Real(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(Error::serialization(format!(
            "unsupported YAML mapping key: {:?}",
            other
        ))),
    }
}
