//! relay_hybrid_connection_authorization_rule

use std::collections::HashMap;

use async_trait::async_trait;

use azurerm_core::context::{OperationContext, Timeouts};
use azurerm_core::provider::ProviderResult;
use azurerm_core::resource::{Resource, ResourceId, State, Value};
use azurerm_core::schema::{AttributeSchema, ResourceSchema, types};

use crate::arm::resourceids::{ParseError, ResourceIdType};
use crate::clients::Clients;
use crate::handler::{ResourceHandler, api_error, require_absent};
use crate::utils::required_str;
use crate::wait::wait_for_deletion;

use super::authorization_rule::{
    expand, flatten_keys, flatten_rights, key_attributes, rights_attributes,
};
use super::ids::{HybridConnectionAuthorizationRuleId, NamespaceId};
use super::validate::{
    authorization_rule_name_type, hybrid_connection_name_type, namespace_name_type,
};

pub const TYPE_NAME: &str = "relay_hybrid_connection_authorization_rule";

pub const TIMEOUTS: Timeouts = Timeouts::minutes(30, 5, 30, 30);

pub fn schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(TYPE_NAME)
        .with_description("Authorization rule on an Azure Relay hybrid connection")
        .attribute(
            AttributeSchema::new("name", authorization_rule_name_type())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("namespace_name", namespace_name_type())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("hybrid_connection_name", hybrid_connection_name_type())
                .required()
                .force_new(),
        );
    for attribute in rights_attributes().into_iter().chain(key_attributes()) {
        schema = schema.attribute(attribute);
    }
    schema
}

fn id_from(
    subscription_id: &str,
    resource: &Resource,
) -> ProviderResult<HybridConnectionAuthorizationRuleId> {
    Ok(NamespaceId::new(
        subscription_id,
        required_str(resource, "resource_group_name")?,
        required_str(resource, "namespace_name")?,
    )
    .hybrid_connection(required_str(resource, "hybrid_connection_name")?)
    .authorization_rule(required_str(resource, "name")?))
}

pub struct HybridConnectionAuthorizationRuleResource {
    clients: Clients,
}

impl HybridConnectionAuthorizationRuleResource {
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl ResourceHandler for HybridConnectionAuthorizationRuleResource {
    fn parse_identifier(&self, identifier: &str) -> Result<String, ParseError> {
        HybridConnectionAuthorizationRuleId::parse(identifier).map(|id| id.id())
    }

    async fn create_or_update(
        &self,
        _ctx: &OperationContext,
        resource: &Resource,
        is_new: bool,
    ) -> ProviderResult<String> {
        let id = id_from(&self.clients.subscription_id, resource)?;
        let relay = &self.clients.relay;

        if is_new {
            let existing = relay.get_hybrid_connection_authorization_rule(&id).await;
            require_absent(&id.id(), &id.describe(), existing)?;
        }

        let payload = expand(resource);
        tracing::debug!(
            rights = ?payload.properties.as_ref().map(|p| &p.rights),
            "creating/updating {}",
            id.describe()
        );
        relay
            .create_or_update_hybrid_connection_authorization_rule(&id, &payload)
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
        let id = HybridConnectionAuthorizationRuleId::parse(identifier)?;
        let relay = &self.clients.relay;

        let rule = match relay.get_hybrid_connection_authorization_rule(&id).await {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                tracing::info!("{} was not found - removing from state", id.describe());
                return Ok(State::not_found(resource_id.clone()));
            }
            Err(e) => return Err(api_error("retrieving", &id.describe(), e)),
        };

        let keys = relay
            .list_hybrid_connection_keys(&id)
            .await
            .map_err(|e| api_error("listing keys for", &id.describe(), e))?;

        let mut attributes = HashMap::new();
        for (name, value) in [
            ("name", &id.authorization_rule_name),
            ("resource_group_name", &id.resource_group_name),
            ("namespace_name", &id.namespace_name),
            ("hybrid_connection_name", &id.hybrid_connection_name),
        ] {
            attributes.insert(name.to_string(), Value::String(value.clone()));
        }
        flatten_rights(&rule, &mut attributes);
        flatten_keys(&keys, &mut attributes);

        Ok(State::existing(resource_id.clone(), attributes).with_identifier(id.id()))
    }

    async fn delete(&self, ctx: &OperationContext, identifier: &str) -> ProviderResult<()> {
        let id = HybridConnectionAuthorizationRuleId::parse(identifier)?;
        let relay = &self.clients.relay;

        match relay.delete_hybrid_connection_authorization_rule(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(api_error("deleting", &id.describe(), e)),
        }

        wait_for_deletion(
            ctx,
            self.clients.delete_poll_interval,
            &id.describe(),
            || relay.get_hybrid_connection_authorization_rule(&id),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_nests_under_hybrid_connection() {
        let resource = Resource::new(TYPE_NAME, "sender")
            .with_attribute("name", Value::String("sender".to_string()))
            .with_attribute("resource_group_name", Value::String("rg".to_string()))
            .with_attribute("namespace_name", Value::String("relay-prod-1".to_string()))
            .with_attribute("hybrid_connection_name", Value::String("orders".to_string()));
        let id = id_from("sub", &resource).unwrap();
        assert_eq!(id.hybrid_connection_name, "orders");
        assert!(id.id().ends_with("/hybridConnections/orders/authorizationRules/sender"));
    }

    #[test]
    fn missing_parent_is_reported() {
        let resource = Resource::new(TYPE_NAME, "sender")
            .with_attribute("name", Value::String("sender".to_string()))
            .with_attribute("resource_group_name", Value::String("rg".to_string()))
            .with_attribute("namespace_name", Value::String("relay-prod-1".to_string()));
        let err = id_from("sub", &resource).unwrap_err();
        assert!(err.message.contains("hybrid_connection_name"));
    }
}
