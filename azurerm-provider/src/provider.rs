//! Azure Resource Manager provider implementation
//!
//! Dispatches each operation to the handler registered for the resource
//! type, and turns handler results into engine states.

use std::collections::HashMap;

use azurerm_core::context::OperationContext;
use azurerm_core::provider::{ErrorKind, ProviderError, ProviderResult};
use azurerm_core::resource::{Resource, ResourceId, State};

use crate::clients::{ClientError, Clients};
use crate::config::ProviderConfig;
use crate::handler::{DataSourceHandler, ResourceHandler};
use crate::relay::data_sources::{
    HYBRID_CONNECTIONS_TYPE_NAME, HybridConnectionsDataSource, NAMESPACE_TYPE_NAME,
    NamespaceDataSource,
};
use crate::relay::hybrid_connection::{self, HybridConnectionResource};
use crate::relay::hybrid_connection_authorization_rule::{
    self, HybridConnectionAuthorizationRuleResource,
};
use crate::relay::namespace::{self, NamespaceResource};
use crate::relay::namespace_authorization_rule::{self, NamespaceAuthorizationRuleResource};

/// Azure Resource Manager provider
pub struct AzurermProvider {
    handlers: HashMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>>,
}

impl AzurermProvider {
    /// Create a provider from configuration, building the API clients
    pub fn new(config: &ProviderConfig) -> Result<Self, ClientError> {
        Ok(Self::with_clients(Clients::new(config)?))
    }

    /// Create a provider around existing clients
    pub fn with_clients(clients: Clients) -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn ResourceHandler>> = HashMap::new();
        handlers.insert(
            namespace::TYPE_NAME,
            Box::new(NamespaceResource::new(clients.clone())),
        );
        handlers.insert(
            namespace_authorization_rule::TYPE_NAME,
            Box::new(NamespaceAuthorizationRuleResource::new(clients.clone())),
        );
        handlers.insert(
            hybrid_connection::TYPE_NAME,
            Box::new(HybridConnectionResource::new(clients.clone())),
        );
        handlers.insert(
            hybrid_connection_authorization_rule::TYPE_NAME,
            Box::new(HybridConnectionAuthorizationRuleResource::new(
                clients.clone(),
            )),
        );

        let mut data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>> = HashMap::new();
        data_sources.insert(
            NAMESPACE_TYPE_NAME,
            Box::new(NamespaceDataSource::new(clients.clone())),
        );
        data_sources.insert(
            HYBRID_CONNECTIONS_TYPE_NAME,
            Box::new(HybridConnectionsDataSource::new(clients)),
        );

        Self {
            handlers,
            data_sources,
        }
    }

    fn handler(&self, id: &ResourceId) -> ProviderResult<&dyn ResourceHandler> {
        self.handlers
            .get(id.resource_type.as_str())
            .map(|h| h.as_ref())
            .ok_or_else(|| {
                ProviderError::validation(format!("Unknown resource type: {}", id.resource_type))
                    .for_resource(id.clone())
            })
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by its stored identifier
    pub async fn read_resource(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let handler = self.handler(id)?;
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        handler
            .read(ctx, id, identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    /// Create a resource and read it back
    pub async fn create_resource(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let id = &resource.id;
        let handler = self.handler(id)?;

        tracing::info!("Creating {}", id);
        let identifier = handler
            .create_or_update(ctx, resource, true)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        self.read_after_write(ctx, handler, id, &identifier).await
    }

    /// Update a resource in place and read it back
    pub async fn update_resource(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        let handler = self.handler(id)?;

        tracing::info!("Updating {}", id);
        let updated = handler
            .create_or_update(ctx, to, false)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
        if updated != identifier {
            tracing::warn!(
                previous = identifier,
                current = %updated,
                "identifier changed on update"
            );
        }

        self.read_after_write(ctx, handler, id, &updated).await
    }

    /// Delete a resource and wait until the API no longer returns it
    pub async fn delete_resource(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<()> {
        let handler = self.handler(id)?;

        tracing::info!("Deleting {}", id);
        handler
            .delete(ctx, identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    /// Adopt an existing remote object
    ///
    /// The identifier is validated before any remote call is made.
    pub async fn import_resource(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let handler = self.handler(id)?;
        let identifier = handler
            .parse_identifier(identifier)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        tracing::info!("Importing {} from {}", id, identifier);
        let state = handler
            .read(ctx, id, &identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
        if !state.exists {
            return Err(ProviderError::new(format!(
                "Cannot import non-existent remote object {:?}",
                identifier
            ))
            .with_kind(ErrorKind::NotFound)
            .for_resource(id.clone()));
        }
        Ok(state)
    }

    /// Read a data source from its lookup arguments
    pub async fn lookup_data_source(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let id = &resource.id;
        let data_source = self
            .data_sources
            .get(id.resource_type.as_str())
            .ok_or_else(|| {
                ProviderError::validation(format!("Unknown data source: {}", id.resource_type))
                    .for_resource(id.clone())
            })?;

        data_source
            .read(ctx, resource)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    async fn read_after_write(
        &self,
        ctx: &OperationContext,
        handler: &dyn ResourceHandler,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let state = handler
            .read(ctx, id, identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
        if !state.exists {
            return Err(ProviderError::api(format!(
                "{:?} was not found after it was written",
                identifier
            ))
            .for_resource(id.clone()));
        }
        Ok(state)
    }
}
