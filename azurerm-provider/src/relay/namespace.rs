//! relay_namespace

use std::collections::HashMap;

use async_trait::async_trait;

use azurerm_core::context::{OperationContext, Timeouts};
use azurerm_core::provider::{ProviderError, ProviderResult};
use azurerm_core::resource::{Resource, ResourceId, State, Value};
use azurerm_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::arm::resourceids::{ParseError, ResourceIdType};
use crate::clients::Clients;
use crate::handler::{ResourceHandler, api_error, require_absent};
use crate::utils::{expand_tags, flatten_tags, normalize_location, required_str, tags_type};
use crate::wait::wait_for_deletion;

use super::authorization_rule::{flatten_keys, key_attributes};
use super::ids::NamespaceId;
use super::models::{RelayNamespace, RelayNamespaceProperties, Sku};
use super::validate::namespace_name_type;

pub const TYPE_NAME: &str = "relay_namespace";

pub const TIMEOUTS: Timeouts = Timeouts::minutes(60, 5, 60, 60);

/// Rule created with every namespace; its keys are exposed on the namespace
pub const ROOT_KEY_NAME: &str = "RootManageSharedAccessKey";

pub fn schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(TYPE_NAME)
        .with_description("Azure Relay namespace")
        .attribute(
            AttributeSchema::new("name", namespace_name_type())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("location", types::non_empty_string())
                .required()
                .force_new()
                .with_normalizer(normalize_location),
        )
        .attribute(
            AttributeSchema::new(
                "sku_name",
                AttributeType::Enum(vec!["Standard".to_string()]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("tags", tags_type()).optional())
        .attribute(AttributeSchema::new("metric_id", AttributeType::String).computed());
    for attribute in key_attributes() {
        schema = schema.attribute(attribute);
    }
    schema
}

/// Configuration -> request payload
pub fn expand(resource: &Resource) -> ProviderResult<RelayNamespace> {
    Ok(RelayNamespace {
        location: normalize_location(required_str(resource, "location")?),
        sku: Some(Sku {
            name: required_str(resource, "sku_name")?.to_string(),
            tier: Some(required_str(resource, "sku_name")?.to_string()),
        }),
        tags: expand_tags(resource),
        properties: Some(RelayNamespaceProperties::default()),
        ..Default::default()
    })
}

/// Response -> attributes, without keys
pub fn flatten(id: &NamespaceId, namespace: &RelayNamespace) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    attributes.insert(
        "name".to_string(),
        Value::String(id.namespace_name.clone()),
    );
    attributes.insert(
        "resource_group_name".to_string(),
        Value::String(id.resource_group_name.clone()),
    );
    attributes.insert(
        "location".to_string(),
        Value::String(normalize_location(&namespace.location)),
    );
    if let Some(sku) = &namespace.sku {
        attributes.insert("sku_name".to_string(), Value::String(sku.name.clone()));
    }
    attributes.insert("tags".to_string(), flatten_tags(namespace.tags.as_ref()));
    if let Some(metric_id) = namespace
        .properties
        .as_ref()
        .and_then(|p| p.metric_id.clone())
    {
        attributes.insert("metric_id".to_string(), Value::String(metric_id));
    }
    attributes
}

pub struct NamespaceResource {
    clients: Clients,
}

impl NamespaceResource {
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }

    /// Read the namespace and its root keys; `None` if it does not exist
    pub(crate) async fn fetch(
        &self,
        id: &NamespaceId,
    ) -> ProviderResult<Option<HashMap<String, Value>>> {
        let namespace = match self.clients.relay.get_namespace(id).await {
            Ok(namespace) => namespace,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(api_error("retrieving", &id.describe(), e)),
        };

        let mut attributes = flatten(id, &namespace);

        let rule_id = id.authorization_rule(ROOT_KEY_NAME);
        let keys = self
            .clients
            .relay
            .list_namespace_keys(&rule_id)
            .await
            .map_err(|e| api_error("listing keys for", &rule_id.describe(), e))?;
        flatten_keys(&keys, &mut attributes);

        Ok(Some(attributes))
    }
}

#[async_trait]
impl ResourceHandler for NamespaceResource {
    fn parse_identifier(&self, identifier: &str) -> Result<String, ParseError> {
        NamespaceId::parse(identifier).map(|id| id.id())
    }

    async fn create_or_update(
        &self,
        _ctx: &OperationContext,
        resource: &Resource,
        is_new: bool,
    ) -> ProviderResult<String> {
        let id = NamespaceId::new(
            &self.clients.subscription_id,
            required_str(resource, "resource_group_name")?,
            required_str(resource, "name")?,
        );

        if is_new {
            let existing = self.clients.relay.get_namespace(&id).await;
            require_absent(&id.id(), &id.describe(), existing)?;
        }

        let payload = expand(resource)?;
        tracing::debug!("creating/updating {}", id.describe());
        self.clients
            .relay
            .create_or_update_namespace(&id, &payload)
            .await
            .map_err(|e| api_error("creating/updating", &id.describe(), e))?;

        Ok(id.id())
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        resource_id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let id = NamespaceId::parse(identifier)?;
        match self.fetch(&id).await? {
            Some(attributes) => {
                Ok(State::existing(resource_id.clone(), attributes).with_identifier(id.id()))
            }
            None => {
                tracing::info!("{} was not found - removing from state", id.describe());
                Ok(State::not_found(resource_id.clone()))
            }
        }
    }

    async fn delete(&self, ctx: &OperationContext, identifier: &str) -> ProviderResult<()> {
        let id = NamespaceId::parse(identifier)?;
        let relay = &self.clients.relay;

        match relay.delete_namespace(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(api_error("deleting", &id.describe(), e)),
        }

        wait_for_deletion(
            ctx,
            self.clients.delete_poll_interval,
            &id.describe(),
            || relay.get_namespace(&id),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azurerm_core::schema::TypeError;

    fn namespace(location: &str) -> Resource {
        Resource::new(TYPE_NAME, "main")
            .with_attribute("name", Value::String("relay-prod-1".to_string()))
            .with_attribute("resource_group_name", Value::String("rg".to_string()))
            .with_attribute("location", Value::String(location.to_string()))
            .with_attribute("sku_name", Value::String("Standard".to_string()))
    }

    #[test]
    fn schema_accepts_valid_namespace() {
        assert!(schema().validate(&namespace("westeurope").attributes).is_ok());
    }

    #[test]
    fn schema_rejects_keys_in_configuration() {
        let resource =
            namespace("westeurope").with_attribute("primary_key", Value::String("k".to_string()));
        let errors = schema().validate(&resource.attributes).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::ComputedAttribute {
                name: "primary_key".to_string()
            }]
        );
    }

    #[test]
    fn expand_normalizes_location() {
        let payload = expand(&namespace("West Europe")).unwrap();
        assert_eq!(payload.location, "westeurope");
        assert_eq!(payload.sku, Some(Sku::standard()));
        assert_eq!(payload.tags, None);
    }

    #[test]
    fn flatten_reads_name_from_id() {
        let id = NamespaceId::new("sub", "rg", "relay-prod-1");
        let response = RelayNamespace {
            location: "West Europe".to_string(),
            sku: Some(Sku::standard()),
            properties: Some(RelayNamespaceProperties {
                metric_id: Some("sub:relay-prod-1".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let attributes = flatten(&id, &response);
        assert_eq!(
            attributes.get("name"),
            Some(&Value::String("relay-prod-1".to_string()))
        );
        assert_eq!(
            attributes.get("location"),
            Some(&Value::String("westeurope".to_string()))
        );
        assert_eq!(
            attributes.get("metric_id"),
            Some(&Value::String("sub:relay-prod-1".to_string()))
        );
    }

    #[test]
    fn key_attributes_are_sensitive() {
        let schema = schema();
        assert!(schema.is_sensitive("primary_connection_string"));
        assert!(schema.is_force_new("location"));
        assert!(!schema.is_force_new("tags"));
    }
}
