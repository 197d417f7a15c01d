//! relay_namespace_authorization_rule

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
use super::ids::{NamespaceAuthorizationRuleId, NamespaceId};
use super::validate::{authorization_rule_name_type, namespace_name_type};

pub const TYPE_NAME: &str = "relay_namespace_authorization_rule";

pub const TIMEOUTS: Timeouts = Timeouts::minutes(30, 5, 30, 30);

pub fn schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(TYPE_NAME)
        .with_description("Authorization rule on an Azure Relay namespace")
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
        );
    for attribute in rights_attributes().into_iter().chain(key_attributes()) {
        schema = schema.attribute(attribute);
    }
    schema
}

pub struct NamespaceAuthorizationRuleResource {
    clients: Clients,
}

impl NamespaceAuthorizationRuleResource {
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl ResourceHandler for NamespaceAuthorizationRuleResource {
    fn parse_identifier(&self, identifier: &str) -> Result<String, ParseError> {
        NamespaceAuthorizationRuleId::parse(identifier).map(|id| id.id())
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
            required_str(resource, "namespace_name")?,
        )
        .authorization_rule(required_str(resource, "name")?);

        if is_new {
            let existing = self
                .clients
                .relay
                .get_namespace_authorization_rule(&id)
                .await;
            require_absent(&id.id(), &id.describe(), existing)?;
        }

        tracing::debug!("creating/updating {}", id.describe());
        self.clients
            .relay
            .create_or_update_namespace_authorization_rule(&id, &expand(resource))
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
        let id = NamespaceAuthorizationRuleId::parse(identifier)?;
        let rule = match self.clients.relay.get_namespace_authorization_rule(&id).await {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                tracing::info!("{} was not found - removing from state", id.describe());
                return Ok(State::not_found(resource_id.clone()));
            }
            Err(e) => return Err(api_error("retrieving", &id.describe(), e)),
        };

        let keys = self
            .clients
            .relay
            .list_namespace_keys(&id)
            .await
            .map_err(|e| api_error("listing keys for", &id.describe(), e))?;

        let mut attributes = std::collections::HashMap::new();
        attributes.insert(
            "name".to_string(),
            Value::String(id.authorization_rule_name.clone()),
        );
        attributes.insert(
            "resource_group_name".to_string(),
            Value::String(id.resource_group_name.clone()),
        );
        attributes.insert(
            "namespace_name".to_string(),
            Value::String(id.namespace_name.clone()),
        );
        flatten_rights(&rule, &mut attributes);
        flatten_keys(&keys, &mut attributes);

        Ok(State::existing(resource_id.clone(), attributes).with_identifier(id.id()))
    }

    async fn delete(&self, ctx: &OperationContext, identifier: &str) -> ProviderResult<()> {
        let id = NamespaceAuthorizationRuleId::parse(identifier)?;
        let relay = &self.clients.relay;

        match relay.delete_namespace_authorization_rule(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(api_error("deleting", &id.describe(), e)),
        }

        wait_for_deletion(
            ctx,
            self.clients.delete_poll_interval,
            &id.describe(),
            || relay.get_namespace_authorization_rule(&id),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rights_default_to_false() {
        let schema = schema();
        let resource = Resource::new(TYPE_NAME, "listen")
            .with_attribute("name", Value::String("listen-only".to_string()))
            .with_attribute("resource_group_name", Value::String("rg".to_string()))
            .with_attribute("namespace_name", Value::String("relay-prod-1".to_string()))
            .with_attribute("listen", Value::Bool(true));
        assert!(schema.validate(&resource.attributes).is_ok());

        let with_defaults = schema.with_defaults(&resource.attributes);
        assert_eq!(with_defaults.get("send"), Some(&Value::Bool(false)));
        assert_eq!(with_defaults.get("manage"), Some(&Value::Bool(false)));
    }
}
