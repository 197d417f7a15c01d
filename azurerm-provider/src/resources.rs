//! Resource type definitions
//!
//! Types are listed in dependency order: parents before children. Apply
//! creates in this order and deletes in reverse.

use azurerm_core::context::Timeouts;
use azurerm_core::provider::ResourceType;
use azurerm_core::resource::Resource;
use azurerm_core::schema::{ResourceSchema, TypeError};

use crate::relay::{
    authorization_rule, data_sources, hybrid_connection, hybrid_connection_authorization_rule,
    namespace, namespace_authorization_rule,
};

macro_rules! define_resource_type {
    ($name:ident, $module:ident) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $module::TYPE_NAME
            }
            fn schema(&self) -> ResourceSchema {
                $module::schema()
            }
            fn timeouts(&self) -> Timeouts {
                $module::TIMEOUTS
            }
        }
    };
    ($name:ident, data_source $type_name:path, $schema:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
            fn timeouts(&self) -> Timeouts {
                data_sources::TIMEOUTS
            }
            fn is_data_source(&self) -> bool {
                true
            }
        }
    };
}

define_resource_type!(NamespaceType, namespace);
define_resource_type!(NamespaceAuthorizationRuleType, namespace_authorization_rule);
define_resource_type!(HybridConnectionType, hybrid_connection);
define_resource_type!(
    HybridConnectionAuthorizationRuleType,
    hybrid_connection_authorization_rule
);
define_resource_type!(
    NamespaceDataSourceType,
    data_source data_sources::NAMESPACE_TYPE_NAME,
    data_sources::namespace_schema
);
define_resource_type!(
    HybridConnectionsDataSourceType,
    data_source data_sources::HYBRID_CONNECTIONS_TYPE_NAME,
    data_sources::hybrid_connections_schema
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(NamespaceType),
        Box::new(NamespaceAuthorizationRuleType),
        Box::new(HybridConnectionType),
        Box::new(HybridConnectionAuthorizationRuleType),
        Box::new(NamespaceDataSourceType),
        Box::new(HybridConnectionsDataSourceType),
    ]
}

/// Position of a managed type in dependency order; unknown types sort last
pub fn rank(resource_type: &str) -> usize {
    const ORDER: [&str; 4] = [
        namespace::TYPE_NAME,
        namespace_authorization_rule::TYPE_NAME,
        hybrid_connection::TYPE_NAME,
        hybrid_connection_authorization_rule::TYPE_NAME,
    ];
    ORDER
        .iter()
        .position(|t| *t == resource_type)
        .unwrap_or(ORDER.len())
}

/// Schema validation plus the per-type rules that span several attributes
pub fn validate(resource: &Resource) -> Result<(), Vec<TypeError>> {
    let resource_type = resource_types().into_iter().find(|t| {
        t.name() == resource.id.resource_type && t.is_data_source() == resource.is_data_source()
    });
    let Some(resource_type) = resource_type else {
        return Err(vec![TypeError::ValidationFailed {
            message: format!("Unknown resource type: {}", resource.id.resource_type),
        }]);
    };

    let mut errors = match resource_type.schema().validate(&resource.attributes) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if !resource.is_data_source()
        && matches!(
            resource.id.resource_type.as_str(),
            namespace_authorization_rule::TYPE_NAME
                | hybrid_connection_authorization_rule::TYPE_NAME
        )
    {
        errors.extend(authorization_rule::validate_rights(resource));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
