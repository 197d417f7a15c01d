//! Resource handler traits
//!
//! Each resource type implements `ResourceHandler` with its Create/Update,
//! Read and Delete logic. `AzurermProvider` looks handlers up by type name
//! and wraps every call with the operation context.

use async_trait::async_trait;

use azurerm_core::context::OperationContext;
use azurerm_core::provider::{ProviderError, ProviderResult};
use azurerm_core::resource::{Resource, ResourceId, State};

use crate::arm::ArmError;
use crate::arm::resourceids::ParseError;

#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Strictly parse an identifier and return its canonical form
    fn parse_identifier(&self, identifier: &str) -> Result<String, ParseError>;

    /// Create (`is_new`) or update the remote object, returning its identifier
    ///
    /// New objects are checked for first so that existing ones are imported
    /// instead of silently adopted.
    async fn create_or_update(
        &self,
        ctx: &OperationContext,
        resource: &Resource,
        is_new: bool,
    ) -> ProviderResult<String>;

    /// Read the remote object; a missing object yields `State::not_found`
    async fn read(
        &self,
        ctx: &OperationContext,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State>;

    /// Delete the remote object and wait until it is gone
    async fn delete(&self, ctx: &OperationContext, identifier: &str) -> ProviderResult<()>;
}

#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    async fn read(&self, ctx: &OperationContext, resource: &Resource) -> ProviderResult<State>;
}

impl From<ParseError> for ProviderError {
    fn from(err: ParseError) -> Self {
        ProviderError::validation(err.to_string())
    }
}

/// Wrap an API failure with what was being done
pub fn api_error(action: &str, target: &str, err: ArmError) -> ProviderError {
    ProviderError::api(format!("{} {}", action, target)).with_cause(err)
}

/// Fail if the object already exists, so it gets imported rather than adopted
pub fn require_absent<T>(
    identifier: &str,
    target: &str,
    existing: Result<T, ArmError>,
) -> ProviderResult<()> {
    match existing {
        Ok(_) => Err(ProviderError::already_exists(identifier)),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("checking for presence of existing", target, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azurerm_core::provider::ErrorKind;

    fn not_found() -> ArmError {
        ArmError::NotFound {
            method: "GET".to_string(),
            url: "https://management.azure.com/x".to_string(),
        }
    }

    #[test]
    fn require_absent_maps_outcomes() {
        assert!(require_absent::<()>("/x", "Relay Namespace", Err(not_found())).is_ok());

        let err = require_absent("/x", "Relay Namespace", Ok(())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);

        let err = require_absent::<()>(
            "/x",
            "Relay Namespace",
            Err(ArmError::Auth("denied".to_string())),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Api);
        assert!(err.message.starts_with("checking for presence of existing"));
    }

    #[test]
    fn parse_errors_are_validation_errors() {
        let err: ProviderError = ParseError::Empty {
            description: "Relay Namespace",
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
