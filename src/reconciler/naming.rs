//! # Table Naming
//!
//! Derives the environment-qualified table name for a declaration.
//!
//! Format: `{base}-{qualifier}`
//!
//! The base comes from the `TableName` property when it has a known shape:
//! - a literal string: `TableName: event-table`
//! - a join whose first part is a literal: `TableName: !Join ['-', [event-table, !Ref AWS::StackName]]`
//!
//! Anything else (`!Ref`, `!Sub`, `!GetAtt`, a join starting with another
//! expression, a missing property) falls back to `{lowercase(logical name)}-{qualifier}`.
//! The fallback never fails, so one unusual resource cannot stop a run.

use crate::template::ResourceDeclaration;
use serde_json::Value;
use tracing::debug;

/// Property holding the table name expression
pub const TABLE_NAME_PROPERTY: &str = "TableName";

const JOIN_FUNCTION: &str = "Fn::Join";

/// A name-valued template expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameExpression {
    /// Plain string
    Literal(String),
    /// `Fn::Join` with its delimiter and ordered parts
    Join {
        delimiter: String,
        parts: Vec<NameExpression>,
    },
    /// Any other shape; carries a short description for diagnostics
    Unsupported(String),
}

impl NameExpression {
    /// Interpret a normalized template value as a name expression
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Literal(s.clone()),
            Value::Object(call) if call.len() == 1 => match call.get(JOIN_FUNCTION) {
                Some(Value::Array(arguments)) => match arguments.as_slice() {
                    [Value::String(delimiter), Value::Array(parts)] => Self::Join {
                        delimiter: delimiter.clone(),
                        parts: parts.iter().map(Self::from_value).collect(),
                    },
                    _ => Self::Unsupported("malformed Fn::Join".to_string()),
                },
                Some(_) => Self::Unsupported("malformed Fn::Join".to_string()),
                None => Self::Unsupported(call.keys().cloned().collect::<Vec<_>>().join(",")),
            },
            Value::Object(_) => Self::Unsupported("mapping".to_string()),
            Value::Array(_) => Self::Unsupported("sequence".to_string()),
            Value::Number(_) => Self::Unsupported("number".to_string()),
            Value::Bool(_) => Self::Unsupported("boolean".to_string()),
            Value::Null => Self::Unsupported("null".to_string()),
        }
    }

    /// The base name this expression contributes, if it has a supported shape
    ///
    /// Only the first part of a join is considered and it must be a literal;
    /// nested expressions are not evaluated. An empty literal is still a base.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Literal(name) => Some(name),
            Self::Join { parts, .. } => match parts.first() {
                Some(Self::Literal(base)) => Some(base),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Fallback name: `{lowercase(logical_name)}-{qualifier}`
#[must_use]
pub fn default_table_name(logical_name: &str, qualifier: &str) -> String {
    format!("{}-{qualifier}", logical_name.to_lowercase())
}

/// Resolve the final table name for a declaration
///
/// Deterministic for a given template and qualifier, which is what makes
/// re-running the provisioner idempotent.
#[must_use]
pub fn resolve_table_name(resource: &ResourceDeclaration, qualifier: &str) -> String {
    let expression = resource
        .property(TABLE_NAME_PROPERTY)
        .map(NameExpression::from_value);

    match expression.as_ref().and_then(NameExpression::base_name) {
        Some(base) => format!("{base}-{qualifier}"),
        None => {
            debug!(
                logical_name = resource.logical_name.as_str(),
                expression = ?expression,
                "TableName not resolvable, using logical name"
            );
            default_table_name(&resource.logical_name, qualifier)
        }
    }
}
