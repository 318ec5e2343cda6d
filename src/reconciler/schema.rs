//! # Table Schema Extraction
//!
//! Copies the provisioning-relevant properties of a table declaration into a
//! [`TableSpec`]. Nothing is cross-checked (key attributes vs. attribute
//! definitions, index throughput vs. billing mode, ...): the store decides what
//! it accepts. Secondary indexes and stream settings are carried opaquely.

use crate::template::ResourceDeclaration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A property had a shape that cannot be read at all
#[derive(Debug, Error)]
#[error("Property {property} has an unreadable shape: {source}")]
pub struct SchemaError {
    pub property: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Role of a key attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    #[serde(rename = "HASH")]
    Partition,
    #[serde(rename = "RANGE")]
    Sort,
}

impl KeyRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Partition => "HASH",
            KeyRole::Sort => "RANGE",
        }
    }
}

/// Scalar type of a key attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl ScalarType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "S",
            ScalarType::Number => "N",
            ScalarType::Binary => "B",
        }
    }
}

/// Capacity mode of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BillingMode {
    #[default]
    #[serde(rename = "PAY_PER_REQUEST")]
    OnDemand,
    #[serde(rename = "PROVISIONED")]
    Provisioned,
}

impl BillingMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::OnDemand => "PAY_PER_REQUEST",
            BillingMode::Provisioned => "PROVISIONED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarType,
}

/// Everything needed to issue a create-table request
///
/// Optional parts are `None` when the declaration has none; an empty index
/// list is treated as absent because the store rejects empty index lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSpec {
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub billing_mode: BillingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_secondary_indexes: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_secondary_indexes: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_specification: Option<Value>,
}

/// Extract the table spec from a declaration's properties
///
/// `Tags` and other properties not listed on [`TableSpec`] are ignored.
///
/// `ProvisionedThroughput` is only carried for `PROVISIONED` tables: without a
/// `BillingMode` the table is on-demand, and the store rejects capacity units
/// on on-demand tables.
pub fn extract_table_spec(resource: &ResourceDeclaration) -> Result<TableSpec, SchemaError> {
    let billing_mode: BillingMode = read_property(resource, "BillingMode")?.unwrap_or_default();
    let provisioned_throughput = match billing_mode {
        BillingMode::Provisioned => resource.property("ProvisionedThroughput").cloned(),
        BillingMode::OnDemand => None,
    };

    Ok(TableSpec {
        key_schema: read_property(resource, "KeySchema")?.unwrap_or_default(),
        attribute_definitions: read_property(resource, "AttributeDefinitions")?
            .unwrap_or_default(),
        billing_mode,
        provisioned_throughput,
        global_secondary_indexes: read_index_list(resource, "GlobalSecondaryIndexes")?,
        local_secondary_indexes: read_index_list(resource, "LocalSecondaryIndexes")?,
        stream_specification: resource.property("StreamSpecification").cloned(),
    })
}

fn read_property<T: DeserializeOwned>(
    resource: &ResourceDeclaration,
    property: &'static str,
) -> Result<Option<T>, SchemaError> {
    resource
        .property(property)
        .map(|value| T::deserialize(value).map_err(|source| SchemaError { property, source }))
        .transpose()
}

fn read_index_list(
    resource: &ResourceDeclaration,
    property: &'static str,
) -> Result<Option<Vec<Value>>, SchemaError> {
    Ok(read_property::<Vec<Value>>(resource, property)?.filter(|indexes| !indexes.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declaration(properties: Value) -> ResourceDeclaration {
        ResourceDeclaration {
            logical_name: "EventTable".to_string(),
            resource_type: "AWS::DynamoDB::Table".to_string(),
            properties: properties.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_extracts_keys_and_attributes_in_order() {
        let spec = extract_table_spec(&declaration(json!({
            "KeySchema": [
                {"AttributeName": "eventId", "KeyType": "HASH"},
                {"AttributeName": "createdAt", "KeyType": "RANGE"}
            ],
            "AttributeDefinitions": [
                {"AttributeName": "eventId", "AttributeType": "S"},
                {"AttributeName": "createdAt", "AttributeType": "N"}
            ]
        })))
        .unwrap();

        assert_eq!(
            spec.key_schema,
            vec![
                KeySchemaElement {
                    attribute_name: "eventId".to_string(),
                    key_type: KeyRole::Partition
                },
                KeySchemaElement {
                    attribute_name: "createdAt".to_string(),
                    key_type: KeyRole::Sort
                },
            ]
        );
        assert_eq!(spec.attribute_definitions[1].attribute_type, ScalarType::Number);
    }

    #[test]
    fn test_billing_mode_defaults_to_on_demand() {
        let spec = extract_table_spec(&declaration(json!({}))).unwrap();
        assert_eq!(spec.billing_mode, BillingMode::OnDemand);
        assert!(spec.key_schema.is_empty());
        assert!(spec.attribute_definitions.is_empty());
    }

    #[test]
    fn test_provisioned_billing_with_throughput() {
        let spec = extract_table_spec(&declaration(json!({
            "BillingMode": "PROVISIONED",
            "ProvisionedThroughput": {"ReadCapacityUnits": 5, "WriteCapacityUnits": 5}
        })))
        .unwrap();
        assert_eq!(spec.billing_mode, BillingMode::Provisioned);
        assert_eq!(
            spec.provisioned_throughput,
            Some(json!({"ReadCapacityUnits": 5, "WriteCapacityUnits": 5}))
        );
    }

    #[test]
    fn test_throughput_without_billing_mode_is_dropped() {
        let spec = extract_table_spec(&declaration(json!({
            "ProvisionedThroughput": {"ReadCapacityUnits": 5, "WriteCapacityUnits": 5}
        })))
        .unwrap();
        assert_eq!(spec.billing_mode, BillingMode::OnDemand);
        assert!(spec.provisioned_throughput.is_none());

        let rendered = serde_json::to_value(&spec).unwrap();
        assert!(rendered.get("ProvisionedThroughput").is_none());
    }

    #[test]
    fn test_throughput_with_on_demand_billing_is_dropped() {
        let spec = extract_table_spec(&declaration(json!({
            "BillingMode": "PAY_PER_REQUEST",
            "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1}
        })))
        .unwrap();
        assert!(spec.provisioned_throughput.is_none());
    }

    #[test]
    fn test_absent_indexes_are_omitted() {
        let spec = extract_table_spec(&declaration(json!({
            "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}]
        })))
        .unwrap();
        assert!(spec.global_secondary_indexes.is_none());
        assert!(spec.local_secondary_indexes.is_none());
        assert!(spec.stream_specification.is_none());

        let rendered = serde_json::to_value(&spec).unwrap();
        assert!(rendered.get("GlobalSecondaryIndexes").is_none());
    }

    #[test]
    fn test_empty_index_list_is_omitted() {
        let spec = extract_table_spec(&declaration(json!({"GlobalSecondaryIndexes": []}))).unwrap();
        assert!(spec.global_secondary_indexes.is_none());
    }

    #[test]
    fn test_indexes_pass_through_verbatim() {
        let gsi = json!({
            "IndexName": "byOwner",
            "KeySchema": [{"AttributeName": "owner", "KeyType": "HASH"}],
            "Projection": {"ProjectionType": "ALL"},
            "SomethingTheStoreWillJudge": true
        });
        let spec = extract_table_spec(&declaration(json!({
            "GlobalSecondaryIndexes": [gsi.clone()],
            "StreamSpecification": {"StreamViewType": "NEW_IMAGE"}
        })))
        .unwrap();
        assert_eq!(spec.global_secondary_indexes, Some(vec![gsi]));
        assert_eq!(
            spec.stream_specification,
            Some(json!({"StreamViewType": "NEW_IMAGE"}))
        );
    }

    #[test]
    fn test_tags_are_ignored() {
        let spec = extract_table_spec(&declaration(json!({
            "Tags": [{"Key": "stack", "Value": {"Ref": "AWS::StackName"}}]
        })))
        .unwrap();
        assert_eq!(spec, TableSpec::default());
    }

    #[test]
    fn test_unreadable_shape_is_reported() {
        let err = extract_table_spec(&declaration(json!({
            "BillingMode": {"Fn::If": ["IsProd", "PROVISIONED", "PAY_PER_REQUEST"]}
        })))
        .unwrap_err();
        assert_eq!(err.property, "BillingMode");

        let err = extract_table_spec(&declaration(json!({
            "KeySchema": [{"AttributeName": "id", "KeyType": "PRIMARY"}]
        })))
        .unwrap_err();
        assert_eq!(err.property, "KeySchema");
    }
}
