//! # DynamoDB Store
//!
//! [`TableStore`] on the official AWS SDK.
//!
//! The client is configured for DynamoDB Local: explicit endpoint, explicit
//! region and static credentials. A table that already exists is reported via
//! `ResourceInUseException` and mapped to [`StoreError::AlreadyExists`]; every
//! other error is surfaced with the service's message.

use super::attribute_value::{attributes_to_item, item_to_attributes};
use super::{Item, StoreError, TableStore};
use crate::config::ProvisionerConfig;
use crate::reconciler::schema::{AttributeDefinition, KeySchemaElement, TableSpec};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::types::{
    self as sdk, BillingMode, GlobalSecondaryIndex, KeyType, LocalSecondaryIndex, Projection,
    ProjectionType, ProvisionedThroughput, PutRequest, ScalarAttributeType, StreamSpecification,
    StreamViewType, WriteRequest,
};
use aws_sdk_dynamodb::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info_span, Instrument};

const CREDENTIALS_PROVIDER_NAME: &str = "table-provisioner";

/// DynamoDB-backed table store
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    endpoint: String,
}

impl DynamoDbStore {
    /// Build a client from the provisioner configuration
    pub async fn new(config: &ProvisionerConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(timeout) = config.operation_timeout() {
            builder = builder.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            );
        }

        debug!(
            endpoint = config.endpoint.as_str(),
            region = config.region.as_str(),
            "DynamoDB client configured"
        );

        Self {
            client: Client::from_conf(builder.build()),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl TableStore for DynamoDbStore {
    async fn create_table(&self, table_name: &str, spec: &TableSpec) -> Result<(), StoreError> {
        let span = info_span!(
            "dynamodb.table.create",
            table.name = table_name,
            endpoint = self.endpoint.as_str()
        );

        async move {
            let request = self
                .client
                .create_table()
                .table_name(table_name)
                .set_key_schema(Some(key_schema(&spec.key_schema)?))
                .set_attribute_definitions(Some(attribute_definitions(
                    &spec.attribute_definitions,
                )?))
                .billing_mode(BillingMode::from(spec.billing_mode.as_str()))
                .set_provisioned_throughput(
                    spec.provisioned_throughput
                        .as_ref()
                        .map(provisioned_throughput)
                        .transpose()?,
                )
                .set_global_secondary_indexes(
                    spec.global_secondary_indexes
                        .as_deref()
                        .map(global_secondary_indexes)
                        .transpose()?,
                )
                .set_local_secondary_indexes(
                    spec.local_secondary_indexes
                        .as_deref()
                        .map(local_secondary_indexes)
                        .transpose()?,
                )
                .set_stream_specification(
                    spec.stream_specification
                        .as_ref()
                        .map(stream_specification)
                        .transpose()?,
                );

            match request.send().await {
                Ok(_) => Ok(()),
                Err(SdkError::ServiceError(service_err))
                    if matches!(
                        service_err.err(),
                        CreateTableError::ResourceInUseException(_)
                    ) =>
                {
                    Err(StoreError::AlreadyExists(table_name.to_string()))
                }
                Err(e) => Err(rejection(&e)),
            }
        }
        .instrument(span)
        .await
    }

    async fn batch_write(&self, table_name: &str, items: &[Item]) -> Result<Vec<Item>, StoreError> {
        let requests = items
            .iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(item_to_attributes(item).map_err(StoreError::Rejected)?))
                    .build()
                    .map_err(|e| StoreError::Rejected(e.to_string()))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table_name, requests)
            .send()
            .instrument(info_span!(
                "dynamodb.batch_write",
                table.name = table_name,
                items = items.len()
            ))
            .await
            .map_err(|e| rejection(&e))?;

        let unprocessed = output
            .unprocessed_items()
            .and_then(|tables| tables.get(table_name))
            .map(|requests| {
                requests
                    .iter()
                    .filter_map(WriteRequest::put_request)
                    .map(|put| attributes_to_item(put.item()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(unprocessed)
    }
}

/// Map an SDK failure to a rejection carrying the service's own message
fn rejection<E, R>(err: &SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let SdkError::ServiceError(service_err) = err {
        if let Some(message) = service_err.err().message() {
            return StoreError::Rejected(message.to_string());
        }
    }
    StoreError::Rejected(DisplayErrorContext(err).to_string())
}

fn key_schema(elements: &[KeySchemaElement]) -> Result<Vec<sdk::KeySchemaElement>, StoreError> {
    elements
        .iter()
        .map(|element| {
            sdk::KeySchemaElement::builder()
                .attribute_name(&element.attribute_name)
                .key_type(KeyType::from(element.key_type.as_str()))
                .build()
                .map_err(|e| StoreError::Rejected(e.to_string()))
        })
        .collect()
}

fn attribute_definitions(
    definitions: &[AttributeDefinition],
) -> Result<Vec<sdk::AttributeDefinition>, StoreError> {
    definitions
        .iter()
        .map(|definition| {
            sdk::AttributeDefinition::builder()
                .attribute_name(&definition.attribute_name)
                .attribute_type(ScalarAttributeType::from(definition.attribute_type.as_str()))
                .build()
                .map_err(|e| StoreError::Rejected(e.to_string()))
        })
        .collect()
}

// Shapes of the opaque index and stream properties, as written in templates.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ThroughputShape {
    #[serde(deserialize_with = "capacity_units")]
    read_capacity_units: i64,
    #[serde(deserialize_with = "capacity_units")]
    write_capacity_units: i64,
}

/// Templates write capacity units either as numbers or as quoted strings
fn capacity_units<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Units {
        Number(i64),
        Text(String),
    }

    match Units::deserialize(deserializer)? {
        Units::Number(units) => Ok(units),
        Units::Text(text) => text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("capacity units must be an integer, got {text:?}"))
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProjectionShape {
    projection_type: Option<String>,
    #[serde(default)]
    non_key_attributes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IndexShape {
    index_name: String,
    #[serde(default)]
    key_schema: Vec<KeySchemaElement>,
    #[serde(default)]
    projection: ProjectionShape,
    provisioned_throughput: Option<ThroughputShape>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StreamShape {
    stream_enabled: Option<bool>,
    stream_view_type: Option<String>,
}

fn read_shape<T: for<'de> Deserialize<'de>>(value: &Value, what: &str) -> Result<T, StoreError> {
    T::deserialize(value).map_err(|e| StoreError::Rejected(format!("invalid {what}: {e}")))
}

fn throughput(shape: &ThroughputShape) -> Result<ProvisionedThroughput, StoreError> {
    ProvisionedThroughput::builder()
        .read_capacity_units(shape.read_capacity_units)
        .write_capacity_units(shape.write_capacity_units)
        .build()
        .map_err(|e| StoreError::Rejected(e.to_string()))
}

fn provisioned_throughput(value: &Value) -> Result<ProvisionedThroughput, StoreError> {
    throughput(&read_shape(value, "ProvisionedThroughput")?)
}

fn projection(shape: &ProjectionShape) -> Projection {
    Projection::builder()
        .set_projection_type(shape.projection_type.as_deref().map(ProjectionType::from))
        .set_non_key_attributes(
            (!shape.non_key_attributes.is_empty()).then(|| shape.non_key_attributes.clone()),
        )
        .build()
}

fn global_secondary_indexes(indexes: &[Value]) -> Result<Vec<GlobalSecondaryIndex>, StoreError> {
    indexes
        .iter()
        .map(|value| {
            let shape: IndexShape = read_shape(value, "GlobalSecondaryIndexes entry")?;
            GlobalSecondaryIndex::builder()
                .index_name(&shape.index_name)
                .set_key_schema(Some(key_schema(&shape.key_schema)?))
                .projection(projection(&shape.projection))
                .set_provisioned_throughput(
                    shape.provisioned_throughput.as_ref().map(throughput).transpose()?,
                )
                .build()
                .map_err(|e| StoreError::Rejected(e.to_string()))
        })
        .collect()
}

fn local_secondary_indexes(indexes: &[Value]) -> Result<Vec<LocalSecondaryIndex>, StoreError> {
    indexes
        .iter()
        .map(|value| {
            let shape: IndexShape = read_shape(value, "LocalSecondaryIndexes entry")?;
            LocalSecondaryIndex::builder()
                .index_name(&shape.index_name)
                .set_key_schema(Some(key_schema(&shape.key_schema)?))
                .projection(projection(&shape.projection))
                .build()
                .map_err(|e| StoreError::Rejected(e.to_string()))
        })
        .collect()
}

/// Templates only carry `StreamViewType`; a declared stream is enabled unless
/// `StreamEnabled: false` is given explicitly.
fn stream_specification(value: &Value) -> Result<StreamSpecification, StoreError> {
    let shape: StreamShape = read_shape(value, "StreamSpecification")?;
    StreamSpecification::builder()
        .stream_enabled(shape.stream_enabled.unwrap_or(true))
        .set_stream_view_type(shape.stream_view_type.as_deref().map(StreamViewType::from))
        .build()
        .map_err(|e| StoreError::Rejected(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::schema::{KeyRole, ScalarType};
    use serde_json::json;

    #[test]
    fn test_key_schema_conversion() {
        let converted = key_schema(&[
            KeySchemaElement {
                attribute_name: "pk".to_string(),
                key_type: KeyRole::Partition,
            },
            KeySchemaElement {
                attribute_name: "sk".to_string(),
                key_type: KeyRole::Sort,
            },
        ])
        .unwrap();

        assert_eq!(converted[0].attribute_name(), "pk");
        assert_eq!(converted[0].key_type(), &KeyType::Hash);
        assert_eq!(converted[1].key_type(), &KeyType::Range);
    }

    #[test]
    fn test_attribute_definition_conversion() {
        let converted = attribute_definitions(&[AttributeDefinition {
            attribute_name: "count".to_string(),
            attribute_type: ScalarType::Number,
        }])
        .unwrap();
        assert_eq!(converted[0].attribute_type(), &ScalarAttributeType::N);
    }

    #[test]
    fn test_global_secondary_index_conversion() {
        let indexes = global_secondary_indexes(&[json!({
            "IndexName": "byOwner",
            "KeySchema": [{"AttributeName": "owner", "KeyType": "HASH"}],
            "Projection": {"ProjectionType": "INCLUDE", "NonKeyAttributes": ["name"]},
            "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 2}
        })])
        .unwrap();

        let index = &indexes[0];
        assert_eq!(index.index_name(), "byOwner");
        assert_eq!(index.key_schema()[0].attribute_name(), "owner");
        assert_eq!(
            index.provisioned_throughput().unwrap().write_capacity_units(),
            2
        );
    }

    #[test]
    fn test_projection_conversion() {
        let converted = projection(&ProjectionShape {
            projection_type: Some("INCLUDE".to_string()),
            non_key_attributes: vec!["name".to_string()],
        });
        assert_eq!(converted.projection_type(), Some(&ProjectionType::Include));
        assert_eq!(converted.non_key_attributes(), ["name".to_string()]);

        let keys_only = projection(&ProjectionShape::default());
        assert!(keys_only.non_key_attributes().is_empty());
    }

    #[test]
    fn test_local_secondary_index_conversion() {
        let indexes = local_secondary_indexes(&[json!({
            "IndexName": "byDate",
            "KeySchema": [
                {"AttributeName": "pk", "KeyType": "HASH"},
                {"AttributeName": "date", "KeyType": "RANGE"}
            ],
            "Projection": {"ProjectionType": "KEYS_ONLY"}
        })])
        .unwrap();
        assert_eq!(indexes[0].key_schema().len(), 2);
    }

    #[test]
    fn test_malformed_index_is_rejected() {
        let err = global_secondary_indexes(&[json!({"KeySchema": []})]).unwrap_err();
        let StoreError::Rejected(message) = err else {
            panic!("expected rejection");
        };
        assert!(message.contains("GlobalSecondaryIndexes"), "{message}");
    }

    #[test]
    fn test_stream_specification_defaults_to_enabled() {
        let stream = stream_specification(&json!({"StreamViewType": "NEW_AND_OLD_IMAGES"})).unwrap();
        assert!(stream.stream_enabled());
        assert_eq!(
            stream.stream_view_type(),
            Some(&StreamViewType::NewAndOldImages)
        );

        let disabled = stream_specification(&json!({"StreamEnabled": false})).unwrap();
        assert!(!disabled.stream_enabled());
    }

    #[test]
    fn test_throughput_requires_numbers() {
        assert!(provisioned_throughput(&json!({"ReadCapacityUnits": 5, "WriteCapacityUnits": 5})).is_ok());
        assert!(provisioned_throughput(&json!({"ReadCapacityUnits": "many"})).is_err());
        assert!(
            provisioned_throughput(&json!({"ReadCapacityUnits": "many", "WriteCapacityUnits": 5}))
                .is_err()
        );
    }

    #[test]
    fn test_throughput_accepts_quoted_numbers() {
        let quoted =
            provisioned_throughput(&json!({"ReadCapacityUnits": "5", "WriteCapacityUnits": 10}))
                .unwrap();
        assert_eq!(quoted.read_capacity_units(), 5);
        assert_eq!(quoted.write_capacity_units(), 10);

        let indexes = global_secondary_indexes(&[json!({
            "IndexName": "byOwner",
            "KeySchema": [{"AttributeName": "owner", "KeyType": "HASH"}],
            "Projection": {"ProjectionType": "ALL"},
            "ProvisionedThroughput": {"ReadCapacityUnits": "3", "WriteCapacityUnits": "4"}
        })])
        .unwrap();
        assert_eq!(
            indexes[0].provisioned_throughput().unwrap().read_capacity_units(),
            3
        );
    }
}
