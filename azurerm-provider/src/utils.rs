//! Utility functions for value normalization and conversion

use std::collections::HashMap;

use azurerm_core::provider::{ProviderError, ProviderResult};
use azurerm_core::resource::{Resource, Value};
use azurerm_core::schema::AttributeType;

const MAX_TAGS: usize = 50;
const MAX_TAG_KEY_LENGTH: usize = 512;
const MAX_TAG_VALUE_LENGTH: usize = 256;

/// Normalize an Azure location (e.g., "West Europe" -> "westeurope")
pub fn normalize_location(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Get a string attribute that schema validation already guarantees
pub fn required_str<'a>(resource: &'a Resource, key: &str) -> ProviderResult<&'a str> {
    resource.get_str(key).ok_or_else(|| {
        ProviderError::validation(format!("Missing required attribute '{}'", key))
    })
}

/// Tags attribute -> API tags
pub fn expand_tags(resource: &Resource) -> Option<HashMap<String, String>> {
    match resource.attributes.get("tags") {
        Some(Value::Map(map)) => Some(
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
        ),
        _ => None,
    }
}

/// API tags -> tags attribute; absent tags flatten to an empty map
pub fn flatten_tags(tags: Option<&HashMap<String, String>>) -> Value {
    Value::Map(
        tags.into_iter()
            .flatten()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Tags type with Azure's limits on count and length
pub fn tags_type() -> AttributeType {
    AttributeType::Custom {
        name: "Tags".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| {
            let Value::Map(map) = value else {
                return Err("Expected map".to_string());
            };
            if map.len() > MAX_TAGS {
                return Err(format!("a maximum of {} tags can be applied", MAX_TAGS));
            }
            for (key, value) in map {
                if key.len() > MAX_TAG_KEY_LENGTH {
                    return Err(format!(
                        "the maximum length for a tag key is {} characters: {:?}",
                        MAX_TAG_KEY_LENGTH, key
                    ));
                }
                if value.as_str().is_some_and(|v| v.len() > MAX_TAG_VALUE_LENGTH) {
                    return Err(format!(
                        "the maximum length for a tag value is {} characters: {:?}",
                        MAX_TAG_VALUE_LENGTH, key
                    ));
                }
            }
            Ok(())
        },
    }
}
