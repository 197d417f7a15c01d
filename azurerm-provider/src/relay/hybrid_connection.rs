//! relay_hybrid_connection

use std::collections::HashMap;

use async_trait::async_trait;

use azurerm_core::context::{OperationContext, Timeouts};
use azurerm_core::provider::ProviderResult;
use azurerm_core::resource::{Resource, ResourceId, State, Value};
use azurerm_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::arm::resourceids::{ParseError, ResourceIdType};
use crate::clients::Clients;
use crate::handler::{ResourceHandler, api_error, require_absent};
use crate::utils::required_str;
use crate::wait::wait_for_deletion;

use super::ids::{HybridConnectionId, NamespaceId};
use super::models::{HybridConnection, HybridConnectionProperties};
use super::validate::{hybrid_connection_name_type, namespace_name_type};

pub const TYPE_NAME: &str = "relay_hybrid_connection";

pub const TIMEOUTS: Timeouts = Timeouts::minutes(30, 5, 30, 30);

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Hybrid connection within an Azure Relay namespace")
        .attribute(
            AttributeSchema::new("name", hybrid_connection_name_type())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", types::non_empty_string())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("relay_namespace_name", namespace_name_type())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("requires_client_authorization", AttributeType::Bool)
                .optional()
                .force_new()
                .with_default(Value::Bool(true)),
        )
        .attribute(AttributeSchema::new("user_metadata", AttributeType::String).optional())
}

fn id_from(subscription_id: &str, resource: &Resource) -> ProviderResult<HybridConnectionId> {
    Ok(NamespaceId::new(
        subscription_id,
        required_str(resource, "resource_group_name")?,
        required_str(resource, "relay_namespace_name")?,
    )
    .hybrid_connection(required_str(resource, "name")?))
}

pub fn expand(resource: &Resource) -> HybridConnection {
    HybridConnection {
        properties: Some(HybridConnectionProperties {
            requires_client_authorization: Some(
                resource
                    .get_bool("requires_client_authorization")
                    .unwrap_or(true),
            ),
            user_metadata: resource.get_str("user_metadata").map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn flatten(id: &HybridConnectionId, hc: &HybridConnection) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    attributes.insert(
        "name".to_string(),
        Value::String(id.hybrid_connection_name.clone()),
    );
    attributes.insert(
        "resource_group_name".to_string(),
        Value::String(id.resource_group_name.clone()),
    );
    attributes.insert(
        "relay_namespace_name".to_string(),
        Value::String(id.namespace_name.clone()),
    );

    let properties = hc.properties.clone().unwrap_or_default();
    attributes.insert(
        "requires_client_authorization".to_string(),
        Value::Bool(properties.requires_client_authorization.unwrap_or(true)),
    );
    if let Some(metadata) = properties.user_metadata {
        attributes.insert("user_metadata".to_string(), Value::String(metadata));
    }
    attributes
}

pub struct HybridConnectionResource {
    clients: Clients,
}

impl HybridConnectionResource {
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl ResourceHandler for HybridConnectionResource {
    fn parse_identifier(&self, identifier: &str) -> Result<String, ParseError> {
        HybridConnectionId::parse(identifier).map(|id| id.id())
    }

    async fn create_or_update(
        &self,
        _ctx: &OperationContext,
        resource: &Resource,
        is_new: bool,
    ) -> ProviderResult<String> {
        let id = id_from(&self.clients.subscription_id, resource)?;

        if is_new {
            let existing = self.clients.relay.get_hybrid_connection(&id).await;
            require_absent(&id.id(), &id.describe(), existing)?;
        }

        tracing::debug!("creating/updating {}", id.describe());
        self.clients
            .relay
            .create_or_update_hybrid_connection(&id, &expand(resource))
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
        let id = HybridConnectionId::parse(identifier)?;
        match self.clients.relay.get_hybrid_connection(&id).await {
            Ok(hc) => Ok(State::existing(resource_id.clone(), flatten(&id, &hc))
                .with_identifier(id.id())),
            Err(e) if e.is_not_found() => {
                tracing::info!("{} was not found - removing from state", id.describe());
                Ok(State::not_found(resource_id.clone()))
            }
            Err(e) => Err(api_error("retrieving", &id.describe(), e)),
        }
    }

    async fn delete(&self, ctx: &OperationContext, identifier: &str) -> ProviderResult<()> {
        let id = HybridConnectionId::parse(identifier)?;
        let relay = &self.clients.relay;

        match relay.delete_hybrid_connection(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(api_error("deleting", &id.describe(), e)),
        }

        wait_for_deletion(
            ctx,
            self.clients.delete_poll_interval,
            &id.describe(),
            || relay.get_hybrid_connection(&id),
        )
        .await
    }
}
