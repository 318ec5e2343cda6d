//! # Template
//!
//! Loading of CloudFormation/SAM templates.
//!
//! The source encoding is YAML (JSON templates parse too, JSON being a subset).
//! Templates are normalized into a canonical `serde_json::Value` tree in which
//! short-form intrinsic tags (`!Join`, `!Ref`, `!GetAtt`, ...) are rewritten to
//! their long form (`{"Fn::Join": ...}`, `{"Ref": ...}`), so later stages only
//! ever see one representation.
//!
//! Mapping order is preserved end to end (`serde_json` is built with
//! `preserve_order`), which keeps resources in declaration order.

pub mod filter;
pub mod normalize;

pub use filter::{resources_of_type, ResourceDeclaration};
pub use normalize::normalize;

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while loading a template
///
/// Any of these aborts the run before a single table is touched.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Template is not well-formed: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Template root must be a mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("Unsupported mapping key: {0}")]
    UnsupportedKey(String),
    #[error("Number {0} cannot be represented in the template model")]
    InvalidNumber(String),
}

/// A parsed template: section name -> section content
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    sections: Map<String, Value>,
}

impl Template {
    /// Parse template text
    ///
    /// An empty document is an empty template.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        match normalize(text)? {
            Value::Object(sections) => Ok(Self { sections }),
            Value::Null => Ok(Self::default()),
            Value::Bool(_) => Err(TemplateError::NotAMapping("a boolean")),
            Value::Number(_) => Err(TemplateError::NotAMapping("a number")),
            Value::String(_) => Err(TemplateError::NotAMapping("a string")),
            Value::Array(_) => Err(TemplateError::NotAMapping("a sequence")),
        }
    }

    /// Read and parse a template file
    pub fn from_path(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Content of a top-level section
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// The `Resources` section, when present and a mapping
    pub fn resources(&self) -> Option<&Map<String, Value>> {
        self.section("Resources").and_then(Value::as_object)
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let template = Template::parse(
            "AWSTemplateFormatVersion: '2010-09-09'\nResources:\n  EventTable:\n    Type: AWS::DynamoDB::Table\n",
        )
        .expect("template should parse");

        assert_eq!(
            template.section("AWSTemplateFormatVersion"),
            Some(&Value::String("2010-09-09".to_string()))
        );
        assert_eq!(template.resources().map(Map::len), Some(1));
    }

    #[test]
    fn test_parse_empty_document_is_empty_template() {
        let template = Template::parse("").expect("empty document should parse");
        assert!(template.resources().is_none());
    }

    #[test]
    fn test_parse_rejects_non_mapping_root() {
        let err = Template::parse("- a\n- b\n").unwrap_err();
        assert!(matches!(err, TemplateError::NotAMapping("a sequence")));
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        let err = Template::parse("Resources:\n  Table: [unclosed\n").unwrap_err();
        assert!(matches!(err, TemplateError::Parse(_)));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Template::from_path(Path::new("/definitely/not/here/template.yaml")).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here/template.yaml"));
    }

    #[test]
    fn test_from_str() {
        let template: Template = "Resources: {}".parse().expect("template should parse");
        assert_eq!(template.resources().map(Map::len), Some(0));
    }
}
