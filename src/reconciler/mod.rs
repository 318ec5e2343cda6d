//! # Reconciler
//!
//! Turns the table declarations of a template into create-table calls.
//!
//! The pipeline for each declaration is:
//! 1. resolve the environment-qualified table name (`naming`)
//! 2. extract the key schema, attribute definitions, billing mode and indexes (`schema`)
//! 3. ask the store to create the table and classify the result (`provision`)
//!
//! Steps 1 and 2 are pure; [`plan_tables`] runs them for the whole template
//! without touching a store, which is what the `plan` command prints.

pub mod naming;
pub mod provision;
pub mod schema;

pub use naming::resolve_table_name;
pub use provision::{
    ConsoleObserver, OutcomeObserver, ProvisionFailed, ProvisionOutcome, ProvisionReport, Reconciler,
    TableOutcome,
};
pub use schema::{extract_table_spec, SchemaError, TableSpec};

use crate::constants::DYNAMODB_TABLE_RESOURCE_TYPE;
use crate::template::{resources_of_type, Template};

/// A table declaration with its resolved name and extracted schema
#[derive(Debug)]
pub struct PlannedTable {
    pub logical_name: String,
    pub table_name: String,
    /// Schema, or why it could not be read
    pub spec: Result<TableSpec, SchemaError>,
}

/// Resolve names and schemas for every table declaration, in declaration order
pub fn plan_tables(template: &Template, qualifier: &str) -> Vec<PlannedTable> {
    resources_of_type(template, DYNAMODB_TABLE_RESOURCE_TYPE)
        .iter()
        .map(|resource| PlannedTable {
            logical_name: resource.logical_name.clone(),
            table_name: resolve_table_name(resource, qualifier),
            spec: extract_table_spec(resource),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_tables() {
        let template = Template::parse(
            r"
Resources:
  EventTable:
    Type: AWS::DynamoDB::Table
    Properties:
      TableName: !Join ['-', [event-table, !Ref AWS::StackName]]
      KeySchema:
        - AttributeName: id
          KeyType: HASH
      AttributeDefinitions:
        - AttributeName: id
          AttributeType: S
  Bucket:
    Type: AWS::S3::Bucket
  BrokenTable:
    Type: AWS::DynamoDB::Table
    Properties:
      KeySchema: id
",
        )
        .unwrap();

        let planned = plan_tables(&template, "dev");
        assert_eq!(planned.len(), 2);

        assert_eq!(planned[0].logical_name, "EventTable");
        assert_eq!(planned[0].table_name, "event-table-dev");
        assert_eq!(planned[0].spec.as_ref().unwrap().key_schema.len(), 1);

        assert_eq!(planned[1].table_name, "brokentable-dev");
        assert!(planned[1].spec.is_err());
    }

    #[test]
    fn test_plan_empty_template() {
        let template = Template::parse("").unwrap();
        assert!(plan_tables(&template, "local").is_empty());
    }
}
