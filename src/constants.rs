//! # Constants
//!
//! Shared constants used throughout the provisioner.
//!
//! These values represent the defaults of the local development stack and can
//! be overridden via environment variables or CLI flags where applicable.

/// Default DynamoDB endpoint (the `dynamodb` service of the local compose stack)
pub const DEFAULT_DYNAMODB_ENDPOINT: &str = "http://dynamodb:8000";

/// Default AWS region handed to the SDK client
pub const DEFAULT_AWS_REGION: &str = "eu-north-1";

/// Default environment qualifier appended to every table name
pub const DEFAULT_STACK_NAME: &str = "local";

/// Default template location, relative to the working directory
pub const DEFAULT_TEMPLATE_PATH: &str = "template.yaml";

/// Credentials accepted by DynamoDB Local (any non-empty value works)
pub const DEFAULT_LOCAL_CREDENTIAL: &str = "fake";

/// Resource type tag selected from the template
pub const DYNAMODB_TABLE_RESOURCE_TYPE: &str = "AWS::DynamoDB::Table";

/// Maximum number of put requests per `BatchWriteItem` call
pub const BATCH_WRITE_MAX_ITEMS: usize = 25;

/// Number of attempts for a batch that keeps returning unprocessed items
pub const BATCH_WRITE_MAX_ATTEMPTS: u32 = 10;

/// Base delay for batch retries; attempt `n` waits `base * 2^n`
pub const BATCH_WRITE_RETRY_BASE_MS: u64 = 50;
