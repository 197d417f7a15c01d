//! Schema and mapping shared by namespace and hybrid connection
//! authorization rules

use std::collections::HashMap;

use azurerm_core::resource::{Resource, Value};
use azurerm_core::schema::{AttributeSchema, AttributeType, TypeError};

use super::models::{AccessKeys, AuthorizationRule, AuthorizationRuleProperties};
use super::rights::RightsFlags;

/// `listen`, `send` and `manage` flags
pub fn rights_attributes() -> Vec<AttributeSchema> {
    ["listen", "send", "manage"]
        .into_iter()
        .map(|name| {
            AttributeSchema::new(name, AttributeType::Bool)
                .optional()
                .with_default(Value::Bool(false))
        })
        .collect()
}

/// Computed key material returned by `listKeys`
pub fn key_attributes() -> Vec<AttributeSchema> {
    [
        "primary_key",
        "primary_connection_string",
        "secondary_key",
        "secondary_connection_string",
    ]
    .into_iter()
    .map(|name| {
        AttributeSchema::new(name, AttributeType::String)
            .computed()
            .sensitive()
    })
    .collect()
}

/// Rights combination check run at plan time
pub fn validate_rights(resource: &Resource) -> Vec<TypeError> {
    match RightsFlags::from_resource(resource).validate() {
        Ok(()) => Vec::new(),
        Err(message) => vec![TypeError::ValidationFailed { message }],
    }
}

pub fn expand(resource: &Resource) -> AuthorizationRule {
    AuthorizationRule {
        properties: Some(AuthorizationRuleProperties {
            rights: RightsFlags::from_resource(resource).expand(),
        }),
        ..Default::default()
    }
}

pub fn flatten_rights(rule: &AuthorizationRule, attributes: &mut HashMap<String, Value>) {
    let rights = rule
        .properties
        .as_ref()
        .map(|p| p.rights.as_slice())
        .unwrap_or_default();
    RightsFlags::flatten(rights).write_attributes(attributes);
}

pub fn flatten_keys(keys: &AccessKeys, attributes: &mut HashMap<String, Value>) {
    for (name, value) in [
        ("primary_key", &keys.primary_key),
        ("primary_connection_string", &keys.primary_connection_string),
        ("secondary_key", &keys.secondary_key),
        ("secondary_connection_string", &keys.secondary_connection_string),
    ] {
        if let Some(value) = value {
            attributes.insert(name.to_string(), Value::String(value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::models::AccessRights;

    #[test]
    fn expand_sends_only_set_rights() {
        let resource = Resource::new("relay_namespace_authorization_rule", "r")
            .with_attribute("listen", Value::Bool(true))
            .with_attribute("manage", Value::Bool(false));
        let rule = expand(&resource);
        assert_eq!(rule.properties.unwrap().rights, vec![AccessRights::Listen]);
    }

    #[test]
    fn flatten_writes_every_flag() {
        let rule = AuthorizationRule {
            properties: Some(AuthorizationRuleProperties {
                rights: vec![AccessRights::Send],
            }),
            ..Default::default()
        };
        let mut attributes = HashMap::new();
        flatten_rights(&rule, &mut attributes);
        assert_eq!(attributes.get("listen"), Some(&Value::Bool(false)));
        assert_eq!(attributes.get("send"), Some(&Value::Bool(true)));
        assert_eq!(attributes.get("manage"), Some(&Value::Bool(false)));
    }

    #[test]
    fn validate_reports_rights_errors() {
        let resource = Resource::new("relay_namespace_authorization_rule", "r")
            .with_attribute("manage", Value::Bool(true));
        assert_eq!(validate_rights(&resource).len(), 1);
    }

    #[test]
    fn keys_are_sensitive() {
        assert!(key_attributes().iter().all(|a| a.sensitive && a.computed));
    }
}
