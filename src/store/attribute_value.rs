//! # Attribute Values
//!
//! Conversion between DynamoDB JSON (`{"S": "text"}`, `{"N": "42"}`, ...) and
//! the SDK's `AttributeValue`. Binary values are base64 encoded in JSON.

use super::Item;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Convert a DynamoDB JSON item into SDK attribute values
pub fn item_to_attributes(item: &Item) -> Result<HashMap<String, AttributeValue>, String> {
    item.iter()
        .map(|(name, value)| {
            to_attribute_value(value)
                .map(|attribute| (name.clone(), attribute))
                .map_err(|e| format!("attribute {name}: {e}"))
        })
        .collect()
}

/// Convert SDK attribute values back into a DynamoDB JSON item
pub fn attributes_to_item(attributes: &HashMap<String, AttributeValue>) -> Item {
    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| (name.clone(), from_attribute_value(&attributes[name])))
        .collect()
}

/// Convert one DynamoDB JSON value
pub fn to_attribute_value(value: &Value) -> Result<AttributeValue, String> {
    let descriptor = value
        .as_object()
        .filter(|descriptor| descriptor.len() == 1)
        .and_then(|descriptor| descriptor.iter().next());
    let Some((type_tag, inner)) = descriptor else {
        return Err(format!("expected a single type descriptor, found {value}"));
    };

    match (type_tag.as_str(), inner) {
        ("S", Value::String(s)) => Ok(AttributeValue::S(s.clone())),
        ("N", Value::String(n)) => Ok(AttributeValue::N(n.clone())),
        ("N", Value::Number(n)) => Ok(AttributeValue::N(n.to_string())),
        ("B", Value::String(encoded)) => decode_blob(encoded).map(AttributeValue::B),
        ("BOOL", Value::Bool(b)) => Ok(AttributeValue::Bool(*b)),
        ("NULL", Value::Bool(b)) => Ok(AttributeValue::Null(*b)),
        ("M", Value::Object(map)) => item_to_attributes(map).map(AttributeValue::M),
        ("L", Value::Array(values)) => values
            .iter()
            .map(to_attribute_value)
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::L),
        ("SS", Value::Array(values)) => strings(values).map(AttributeValue::Ss),
        ("NS", Value::Array(values)) => strings(values).map(AttributeValue::Ns),
        ("BS", Value::Array(values)) => strings(values)?
            .iter()
            .map(|encoded| decode_blob(encoded))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::Bs),
        (other, inner) => Err(format!("unsupported type descriptor {other} for {inner}")),
    }
}

/// Convert one SDK attribute value to DynamoDB JSON
pub fn from_attribute_value(attribute: &AttributeValue) -> Value {
    let (type_tag, inner) = match attribute {
        AttributeValue::S(s) => ("S", Value::String(s.clone())),
        AttributeValue::N(n) => ("N", Value::String(n.clone())),
        AttributeValue::B(blob) => ("B", Value::String(STANDARD.encode(blob.as_ref()))),
        AttributeValue::Bool(b) => ("BOOL", Value::Bool(*b)),
        AttributeValue::Null(b) => ("NULL", Value::Bool(*b)),
        AttributeValue::M(map) => ("M", Value::Object(attributes_to_item(map))),
        AttributeValue::L(values) => (
            "L",
            Value::Array(values.iter().map(from_attribute_value).collect()),
        ),
        AttributeValue::Ss(values) => ("SS", string_array(values)),
        AttributeValue::Ns(values) => ("NS", string_array(values)),
        AttributeValue::Bs(blobs) => (
            "BS",
            Value::Array(
                blobs
                    .iter()
                    .map(|blob| Value::String(STANDARD.encode(blob.as_ref())))
                    .collect(),
            ),
        ),
        _ => return Value::Null,
    };

    let mut descriptor = Map::with_capacity(1);
    descriptor.insert(type_tag.to_string(), inner);
    Value::Object(descriptor)
}

fn decode_blob(encoded: &str) -> Result<Blob, String> {
    STANDARD
        .decode(encoded)
        .map(Blob::new)
        .map_err(|e| format!("invalid base64 binary value: {e}"))
}

fn strings(values: &[Value]) -> Result<Vec<String>, String> {
    values
        .iter()
        .map(|value| match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(format!("expected a string set member, found {other}")),
        })
        .collect()
}

fn string_array(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}
