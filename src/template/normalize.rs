//! # Template Normalizer
//!
//! Converts YAML template text into the canonical `serde_json::Value` tree.

use super::TemplateError;
use serde_json::{Map, Number, Value};
use serde_yaml::value::TaggedValue;
use serde_yaml::Value as YamlValue;

/// Parse template text and normalize it
///
/// Pure transform: no I/O, no resolution of intrinsic functions. Short-form
/// tags are rewritten to the long form used by JSON templates:
///
/// | Tag | Canonical form |
/// |---|---|
/// | `!Ref x` | `{"Ref": "x"}` |
/// | `!Condition x` | `{"Condition": "x"}` |
/// | `!GetAtt A.B` | `{"Fn::GetAtt": ["A", "B"]}` |
/// | `!<Name> v` | `{"Fn::<Name>": v}` |
pub fn normalize(text: &str) -> Result<Value, TemplateError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let raw: YamlValue = serde_yaml::from_str(text)?;
    canonicalize(raw)
}

fn canonicalize(value: YamlValue) -> Result<Value, TemplateError> {
    match value {
        YamlValue::Null => Ok(Value::Null),
        YamlValue::Bool(b) => Ok(Value::Bool(b)),
        YamlValue::Number(n) => canonical_number(&n).map(Value::Number),
        YamlValue::String(s) => Ok(Value::String(s)),
        YamlValue::Sequence(items) => items
            .into_iter()
            .map(canonicalize)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        YamlValue::Mapping(mapping) => {
            let mut out = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                out.insert(mapping_key(key)?, canonicalize(value)?);
            }
            Ok(Value::Object(out))
        }
        YamlValue::Tagged(tagged) => intrinsic(*tagged),
    }
}

/// Rewrite a short-form intrinsic tag to its long form
fn intrinsic(tagged: TaggedValue) -> Result<Value, TemplateError> {
    let tag = tagged.tag.to_string();
    let name = tag.trim_start_matches('!');
    let argument = canonicalize(tagged.value)?;

    let (key, argument) = match name {
        "Ref" | "Condition" => (name.to_string(), argument),
        "GetAtt" => ("Fn::GetAtt".to_string(), split_get_att(argument)),
        other => (format!("Fn::{other}"), argument),
    };

    let mut call = Map::with_capacity(1);
    call.insert(key, argument);
    Ok(Value::Object(call))
}

/// `!GetAtt Resource.Attribute` is shorthand for `[Resource, Attribute]`
fn split_get_att(argument: Value) -> Value {
    match argument {
        Value::String(s) => match s.split_once('.') {
            Some((resource, attribute)) => Value::Array(vec![
                Value::String(resource.to_string()),
                Value::String(attribute.to_string()),
            ]),
            None => Value::String(s),
        },
        other => other,
    }
}

fn mapping_key(key: YamlValue) -> Result<String, TemplateError> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        other => Err(TemplateError::UnsupportedKey(format!("{other:?}"))),
    }
}

fn canonical_number(n: &serde_yaml::Number) -> Result<Number, TemplateError> {
    if let Some(i) = n.as_i64() {
        Ok(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Number::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .ok_or_else(|| TemplateError::InvalidNumber(n.to_string()))
    }
}
