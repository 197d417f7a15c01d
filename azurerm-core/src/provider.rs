//! Provider - Trait abstracting resource operations
//!
//! A Provider defines operations for a specific infrastructure API (here,
//! Azure Resource Manager). It is responsible for turning planned changes
//! into actual API calls.

use std::future::Future;
use std::pin::Pin;

use crate::context::{OperationContext, Timeouts};
use crate::resource::{Resource, ResourceId, State};
use crate::schema::{ResourceSchema, TypeError};

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration is invalid; detected before any remote call
    Validation,
    /// Create attempted against an object that already exists remotely
    AlreadyExists,
    /// Imported object does not exist
    NotFound,
    /// Remote API returned an unexpected response
    Api,
    /// The operation did not finish before its deadline
    Timeout,
    Other,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub kind: ErrorKind,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Other,
            resource_id: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Validation)
    }

    pub fn already_exists(identifier: &str) -> Self {
        Self::new(format!(
            "A resource with the ID {:?} already exists - to be managed this resource needs to be imported into the state",
            identifier
        ))
        .with_kind(ErrorKind::AlreadyExists)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Api)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Timeout)
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "relay_namespace")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    /// Default operation timeouts
    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Whether this type is a read-only data source
    fn is_data_source(&self) -> bool {
        false
    }
}

/// Main Provider trait
///
/// All remote operations are async and receive the `OperationContext` that
/// bounds them and carries their logging span.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "azurerm")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Look up a managed resource type by name
    fn resource_type(&self, name: &str) -> Option<Box<dyn ResourceType>> {
        self.resource_types()
            .into_iter()
            .find(|t| t.name() == name && !t.is_data_source())
    }

    /// Look up a data source type by name
    fn data_source_type(&self, name: &str) -> Option<Box<dyn ResourceType>> {
        self.resource_types()
            .into_iter()
            .find(|t| t.name() == name && t.is_data_source())
    }

    /// Plan-time validation; never performs remote calls
    fn validate(&self, resource: &Resource) -> Result<(), Vec<TypeError>>;

    /// Get the current state of a resource
    ///
    /// Returns `State::not_found()` if the resource does not exist or no
    /// identifier has been recorded yet.
    fn read(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Read a data source from its configured arguments
    fn read_data_source(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the ARM resource ID
    fn create(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource, returning once the API confirms it is gone
    fn delete(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Adopt an existing remote object by its identifier
    fn import(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<State>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn validate(&self, resource: &Resource) -> Result<(), Vec<TypeError>> {
        (**self).validate(resource)
    }

    fn read(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(ctx, id, identifier)
    }

    fn read_data_source(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(ctx, resource)
    }

    fn create(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(ctx, resource)
    }

    fn update(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(ctx, id, identifier, from, to)
    }

    fn delete(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(ctx, id, identifier)
    }

    fn import(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).import(ctx, id, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Operation;
    use std::time::Duration;

    // Mock Provider for testing
    struct MockProvider;

    struct MockType;

    impl ResourceType for MockType {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("mock")
        }
    }

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![Box::new(MockType)]
        }

        fn validate(&self, _resource: &Resource) -> Result<(), Vec<TypeError>> {
            Ok(())
        }

        fn read(
            &self,
            _ctx: &OperationContext,
            id: &ResourceId,
            _identifier: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn read_data_source(
            &self,
            _ctx: &OperationContext,
            resource: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn create(
            &self,
            _ctx: &OperationContext,
            resource: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs).with_identifier("mock-id-123")) })
        }

        fn update(
            &self,
            _ctx: &OperationContext,
            id: &ResourceId,
            _identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs)) })
        }

        fn delete(
            &self,
            _ctx: &OperationContext,
            _id: &ResourceId,
            _identifier: &str,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn import(
            &self,
            _ctx: &OperationContext,
            id: &ResourceId,
            _identifier: &str,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move {
                Err(ProviderError::new("not found")
                    .with_kind(ErrorKind::NotFound)
                    .for_resource(id))
            })
        }
    }

    fn ctx() -> OperationContext {
        OperationContext::new(Operation::Read, Duration::from_secs(5), tracing::Span::none())
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider = MockProvider;
        let id = ResourceId::new("test", "example");
        let state = provider.read(&ctx(), &id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn mock_provider_create_returns_existing() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let resource = Resource::new("test", "example");
        let state = provider.create(&ctx(), &resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier, Some("mock-id-123".to_string()));
    }

    #[test]
    fn resource_type_lookup_by_name() {
        let provider = MockProvider;
        assert!(provider.resource_type("mock").is_some());
        assert!(provider.resource_type("other").is_none());
        assert!(provider.data_source_type("mock").is_none());
    }

    #[test]
    fn error_display_includes_resource_and_cause() {
        let cause = std::io::Error::other("connection reset");
        let err = ProviderError::api("deleting Relay Namespace")
            .for_resource(ResourceId::new("relay_namespace", "main"))
            .with_cause(cause);
        assert_eq!(
            err.to_string(),
            "[relay_namespace.main] deleting Relay Namespace: connection reset"
        );
        assert_eq!(err.kind, ErrorKind::Api);
    }

    #[test]
    fn already_exists_error_mentions_import() {
        let err = ProviderError::already_exists("/subscriptions/x");
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert!(err.message.contains("imported"));
    }
}
