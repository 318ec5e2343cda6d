//! # Provisioner Configuration
//!
//! Settings loaded from environment variables.

use crate::constants::{
    DEFAULT_AWS_REGION, DEFAULT_DYNAMODB_ENDPOINT, DEFAULT_LOCAL_CREDENTIAL, DEFAULT_STACK_NAME,
    DEFAULT_TEMPLATE_PATH,
};
use std::path::PathBuf;
use std::time::Duration;

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per record
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Provisioner configuration
///
/// All settings have defaults matching the local compose stack and can be
/// overridden via environment variables (a `.env` file is honoured by the binary).
#[derive(Clone)]
pub struct ProvisionerConfig {
    /// DynamoDB endpoint URL
    pub endpoint: String,
    /// AWS region for the SDK client
    pub region: String,
    /// Environment qualifier appended to every resolved table name
    pub stack_name: String,
    /// Path of the CloudFormation/SAM template
    pub template_path: PathBuf,
    /// Static access key id (DynamoDB Local accepts anything)
    pub access_key_id: String,
    /// Static secret access key
    pub secret_access_key: String,
    /// Optional per-operation timeout for SDK calls (milliseconds)
    pub operation_timeout_ms: Option<u64>,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Exit successfully even when some tables failed
    pub allow_failures: bool,
}

impl std::fmt::Debug for ProvisionerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionerConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("stack_name", &self.stack_name)
            .field("template_path", &self.template_path)
            .field("secret_access_key", &"***")
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("allow_failures", &self.allow_failures)
            .finish_non_exhaustive()
    }
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DYNAMODB_ENDPOINT.to_string(),
            region: DEFAULT_AWS_REGION.to_string(),
            stack_name: DEFAULT_STACK_NAME.to_string(),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            access_key_id: DEFAULT_LOCAL_CREDENTIAL.to_string(),
            secret_access_key: DEFAULT_LOCAL_CREDENTIAL.to_string(),
            operation_timeout_ms: None,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Text,
            allow_failures: false,
        }
    }
}

impl ProvisionerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Used by `from_env`; tests pass a map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            endpoint: env_var_or_default_str(&lookup, "DYNAMODB_ENDPOINT", DEFAULT_DYNAMODB_ENDPOINT),
            region: env_var_or_default_str(&lookup, "AWS_REGION", DEFAULT_AWS_REGION),
            stack_name: env_var_or_default_str(&lookup, "STACK_NAME", DEFAULT_STACK_NAME),
            template_path: PathBuf::from(env_var_or_default_str(
                &lookup,
                "TEMPLATE_PATH",
                DEFAULT_TEMPLATE_PATH,
            )),
            access_key_id: env_var_or_default_str(
                &lookup,
                "AWS_ACCESS_KEY_ID",
                DEFAULT_LOCAL_CREDENTIAL,
            ),
            secret_access_key: env_var_or_default_str(
                &lookup,
                "AWS_SECRET_ACCESS_KEY",
                DEFAULT_LOCAL_CREDENTIAL,
            ),
            operation_timeout_ms: lookup("DYNAMODB_TIMEOUT_MS").and_then(|v| v.parse().ok()),
            log_level: env_var_or_default_str(&lookup, "LOG_LEVEL", "INFO"),
            log_format: LogFormat::parse(&env_var_or_default_str(&lookup, "LOG_FORMAT", "text")),
            allow_failures: env_var_or_default_bool(&lookup, "ALLOW_FAILURES", false),
        }
    }

    /// Get the SDK operation timeout, if one is configured
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

/// Read variable as boolean or return default
fn env_var_or_default_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read variable as string or return default (empty values count as unset)
fn env_var_or_default_str<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
