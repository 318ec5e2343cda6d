//! # Resource Filter
//!
//! Selects resource declarations of one type from a normalized template.

use super::Template;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One entry of the `Resources` section
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeclaration {
    /// Logical name (the key under `Resources`, unique within the template)
    pub logical_name: String,
    /// Type tag, e.g. `AWS::DynamoDB::Table`
    pub resource_type: String,
    /// Free-form, type-specific properties (empty when absent)
    pub properties: Map<String, Value>,
}

impl ResourceDeclaration {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// Collect the resources whose `Type` equals `resource_type` exactly
///
/// Output order is the declaration order of the `Resources` mapping. A template
/// without matches (or without a `Resources` section) yields an empty vector.
pub fn resources_of_type(template: &Template, resource_type: &str) -> Vec<ResourceDeclaration> {
    let Some(resources) = template.resources() else {
        if template.section("Resources").is_some() {
            warn!("Template Resources section is not a mapping, nothing to provision");
        }
        return Vec::new();
    };

    resources
        .iter()
        .filter_map(|(logical_name, resource)| {
            let declared_type = resource.get("Type").and_then(Value::as_str);
            if declared_type != Some(resource_type) {
                debug!(
                    logical_name = logical_name.as_str(),
                    resource_type = declared_type.unwrap_or("<none>"),
                    "Skipping resource of another type"
                );
                return None;
            }

            let properties = resource
                .get("Properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            Some(ResourceDeclaration {
                logical_name: logical_name.clone(),
                resource_type: resource_type.to_string(),
                properties,
            })
        })
        .collect()
}
