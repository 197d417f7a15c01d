//! Azure Resource Manager provider for Azure Relay
//!
//! ## Module Structure
//!
//! - `arm` - ARM REST client, authentication and resource ID parsing
//! - `relay` - Relay namespaces, hybrid connections and authorization rules
//! - `handler` - Per-resource CRUD handler traits
//! - `provider` - AzurermProvider implementation
//! - `resources` - Resource type registry
//! - `clients` - Client bundle shared by handlers
//! - `config` - Provider configuration
//! - `wait` - Deletion polling
//! - `utils` - Helper functions for value normalization

pub mod arm;
pub mod clients;
pub mod config;
pub mod handler;
pub mod provider;
pub mod relay;
pub mod resources;
pub mod utils;
pub mod wait;

// Re-export main types
pub use clients::Clients;
pub use config::{ConfigError, ProviderConfig};
pub use provider::AzurermProvider;

use azurerm_core::context::OperationContext;
use azurerm_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use azurerm_core::resource::{Resource, ResourceId, State};
use azurerm_core::schema::TypeError;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AzurermProvider {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn validate(&self, resource: &Resource) -> Result<(), Vec<TypeError>> {
        resources::validate(resource)
    }

    fn read(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let ctx = ctx.clone();
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move {
            ctx.run(self.read_resource(&ctx, &id, identifier.as_deref()))
                .await
                .map_err(|e| e.for_resource(id))
        })
    }

    fn read_data_source(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let ctx = ctx.clone();
        let resource = resource.clone();
        Box::pin(async move {
            ctx.run(self.lookup_data_source(&ctx, &resource))
                .await
                .map_err(|e| e.for_resource(resource.id))
        })
    }

    fn create(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let ctx = ctx.clone();
        let resource = resource.clone();
        Box::pin(async move {
            ctx.run(self.create_resource(&ctx, &resource))
                .await
                .map_err(|e| e.for_resource(resource.id))
        })
    }

    fn update(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let ctx = ctx.clone();
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move {
            ctx.run(self.update_resource(&ctx, &id, &identifier, &to))
                .await
                .map_err(|e| e.for_resource(id))
        })
    }

    fn delete(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let ctx = ctx.clone();
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            ctx.run(self.delete_resource(&ctx, &id, &identifier))
                .await
                .map_err(|e| e.for_resource(id))
        })
    }

    fn import(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let ctx = ctx.clone();
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            ctx.run(self.import_resource(&ctx, &id, &identifier))
                .await
                .map_err(|e| e.for_resource(id))
        })
    }
}
