//! Read-only lookups: `relay_namespace` and `relay_hybrid_connections`

use std::collections::HashMap;

use async_trait::async_trait;

use azurerm_core::context::{OperationContext, Timeouts};
use azurerm_core::provider::{ErrorKind, ProviderError, ProviderResult};
use azurerm_core::resource::{Resource, State, Value};
use azurerm_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::arm::resourceids::ResourceIdType;
use crate::clients::Clients;
use crate::handler::{DataSourceHandler, api_error};
use crate::utils::required_str;

use super::authorization_rule::key_attributes;
use super::ids::{HybridConnectionId, NamespaceId};
use super::namespace::NamespaceResource;

pub const NAMESPACE_TYPE_NAME: &str = "relay_namespace";
pub const HYBRID_CONNECTIONS_TYPE_NAME: &str = "relay_hybrid_connections";

pub const TIMEOUTS: Timeouts = Timeouts::minutes(5, 5, 5, 5);

pub fn namespace_schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(NAMESPACE_TYPE_NAME)
        .with_description("Look up an existing Azure Relay namespace")
        .attribute(AttributeSchema::new("name", types::non_empty_string()).required())
        .attribute(
            AttributeSchema::new("resource_group_name", types::non_empty_string()).required(),
        );
    for name in ["location", "sku_name", "metric_id"] {
        schema = schema.attribute(AttributeSchema::new(name, AttributeType::String).computed());
    }
    schema = schema.attribute(AttributeSchema::new("tags", types::tags()).computed());
    for attribute in key_attributes() {
        schema = schema.attribute(attribute);
    }
    schema
}

pub fn hybrid_connections_schema() -> ResourceSchema {
    let strings = || AttributeType::List(Box::new(AttributeType::String));
    ResourceSchema::new(HYBRID_CONNECTIONS_TYPE_NAME)
        .with_description("List the hybrid connections of an Azure Relay namespace")
        .attribute(
            AttributeSchema::new("resource_group_name", types::non_empty_string()).required(),
        )
        .attribute(
            AttributeSchema::new("relay_namespace_name", types::non_empty_string()).required(),
        )
        .attribute(AttributeSchema::new("names", strings()).computed())
        .attribute(AttributeSchema::new("ids", strings()).computed())
}

pub struct NamespaceDataSource {
    namespace: NamespaceResource,
    subscription_id: String,
}

impl NamespaceDataSource {
    pub fn new(clients: Clients) -> Self {
        Self {
            subscription_id: clients.subscription_id.clone(),
            namespace: NamespaceResource::new(clients),
        }
    }
}

#[async_trait]
impl DataSourceHandler for NamespaceDataSource {
    async fn read(&self, _ctx: &OperationContext, resource: &Resource) -> ProviderResult<State> {
        let id = NamespaceId::new(
            &self.subscription_id,
            required_str(resource, "resource_group_name")?,
            required_str(resource, "name")?,
        );

        match self.namespace.fetch(&id).await? {
            Some(attributes) => {
                Ok(State::existing(resource.id.clone(), attributes).with_identifier(id.id()))
            }
            None => Err(
                ProviderError::new(format!("{} was not found", id.describe()))
                    .with_kind(ErrorKind::NotFound),
            ),
        }
    }
}

pub struct HybridConnectionsDataSource {
    clients: Clients,
}

impl HybridConnectionsDataSource {
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl DataSourceHandler for HybridConnectionsDataSource {
    async fn read(&self, _ctx: &OperationContext, resource: &Resource) -> ProviderResult<State> {
        let namespace = NamespaceId::new(
            &self.clients.subscription_id,
            required_str(resource, "resource_group_name")?,
            required_str(resource, "relay_namespace_name")?,
        );

        let items = self
            .clients
            .relay
            .list_hybrid_connections(&namespace)
            .await
            .map_err(|e| api_error("listing hybrid connections in", &namespace.describe(), e))?;

        let mut names = Vec::with_capacity(items.len());
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let Some(raw) = item.id else {
                continue;
            };
            // IDs returned by the API may not use canonical casing
            let id = match HybridConnectionId::parse_insensitively(&raw) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(
                        id = %raw,
                        error = %e,
                        "skipping unparseable hybrid connection"
                    );
                    continue;
                }
            };
            names.push(Value::String(id.hybrid_connection_name.clone()));
            ids.push(Value::String(id.id()));
        }
        tracing::debug!(count = ids.len(), "listed hybrid connections");

        let mut attributes = HashMap::new();
        attributes.insert(
            "resource_group_name".to_string(),
            Value::String(namespace.resource_group_name.clone()),
        );
        attributes.insert(
            "relay_namespace_name".to_string(),
            Value::String(namespace.namespace_name.clone()),
        );
        attributes.insert("names".to_string(), Value::List(names));
        attributes.insert("ids".to_string(), Value::List(ids));

        Ok(State::existing(resource.id.clone(), attributes).with_identifier(namespace.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_schemas_only_take_lookup_arguments() {
        let resource = Resource::new(NAMESPACE_TYPE_NAME, "existing")
            .with_read_only(true)
            .with_attribute("name", Value::String("relay-prod-1".to_string()))
            .with_attribute("resource_group_name", Value::String("rg".to_string()))
            .with_attribute("location", Value::String("westeurope".to_string()));
        let errors = namespace_schema().validate(&resource.attributes).unwrap_err();
        assert_eq!(errors.len(), 1);

        let list = Resource::new(HYBRID_CONNECTIONS_TYPE_NAME, "all")
            .with_attribute("resource_group_name", Value::String("rg".to_string()))
            .with_attribute("relay_namespace_name", Value::String("relay-prod-1".to_string()));
        assert!(hybrid_connections_schema().validate(&list.attributes).is_ok());
    }
}
