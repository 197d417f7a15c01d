//! Typed resource IDs for Microsoft.Relay

use std::fmt;

use crate::arm::resourceids::{ParsedId, ResourceIdType, Segment, resource_group_scope};

fn namespace_segments() -> Vec<Segment> {
    let mut segments = resource_group_scope().to_vec();
    segments.extend([
        Segment::fixed("staticProviders", "providers"),
        Segment::fixed("staticMicrosoftRelay", "Microsoft.Relay"),
        Segment::fixed("staticNamespaces", "namespaces"),
        Segment::user("namespaceName"),
    ]);
    segments
}

fn hybrid_connection_segments() -> Vec<Segment> {
    let mut segments = namespace_segments();
    segments.extend([
        Segment::fixed("staticHybridConnections", "hybridConnections"),
        Segment::user("hybridConnectionName"),
    ]);
    segments
}

fn with_authorization_rule(mut segments: Vec<Segment>) -> Vec<Segment> {
    segments.extend([
        Segment::fixed("staticAuthorizationRules", "authorizationRules"),
        Segment::user("authorizationRuleName"),
    ]);
    segments
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.id())
                }
            }
        )*
    };
}

/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Relay/namespaces/{ns}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub namespace_name: String,
}

impl NamespaceId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        namespace_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            namespace_name: namespace_name.into(),
        }
    }

    pub fn authorization_rule(&self, name: impl Into<String>) -> NamespaceAuthorizationRuleId {
        NamespaceAuthorizationRuleId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            namespace_name: self.namespace_name.clone(),
            authorization_rule_name: name.into(),
        }
    }

    pub fn hybrid_connection(&self, name: impl Into<String>) -> HybridConnectionId {
        HybridConnectionId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            namespace_name: self.namespace_name.clone(),
            hybrid_connection_name: name.into(),
        }
    }
}

impl ResourceIdType for NamespaceId {
    const DESCRIPTION: &'static str = "Relay Namespace";

    fn segments() -> Vec<Segment> {
        namespace_segments()
    }

    fn from_parsed(parsed: &ParsedId) -> Self {
        Self::new(
            parsed.value("subscriptionId"),
            parsed.value("resourceGroupName"),
            parsed.value("namespaceName"),
        )
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Relay/namespaces/{}",
            self.subscription_id, self.resource_group_name, self.namespace_name
        )
    }
}

/// Authorization rule scoped to a namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceAuthorizationRuleId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub namespace_name: String,
    pub authorization_rule_name: String,
}

impl NamespaceAuthorizationRuleId {
    pub fn namespace_id(&self) -> NamespaceId {
        NamespaceId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.namespace_name,
        )
    }
}

impl ResourceIdType for NamespaceAuthorizationRuleId {
    const DESCRIPTION: &'static str = "Relay Namespace Authorization Rule";

    fn segments() -> Vec<Segment> {
        with_authorization_rule(namespace_segments())
    }

    fn from_parsed(parsed: &ParsedId) -> Self {
        Self {
            subscription_id: parsed.value("subscriptionId"),
            resource_group_name: parsed.value("resourceGroupName"),
            namespace_name: parsed.value("namespaceName"),
            authorization_rule_name: parsed.value("authorizationRuleName"),
        }
    }

    fn id(&self) -> String {
        format!(
            "{}/authorizationRules/{}",
            self.namespace_id().id(),
            self.authorization_rule_name
        )
    }
}

/// `.../namespaces/{ns}/hybridConnections/{hc}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HybridConnectionId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub namespace_name: String,
    pub hybrid_connection_name: String,
}

impl HybridConnectionId {
    pub fn namespace_id(&self) -> NamespaceId {
        NamespaceId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.namespace_name,
        )
    }

    pub fn authorization_rule(
        &self,
        name: impl Into<String>,
    ) -> HybridConnectionAuthorizationRuleId {
        HybridConnectionAuthorizationRuleId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            namespace_name: self.namespace_name.clone(),
            hybrid_connection_name: self.hybrid_connection_name.clone(),
            authorization_rule_name: name.into(),
        }
    }
}

impl ResourceIdType for HybridConnectionId {
    const DESCRIPTION: &'static str = "Relay Hybrid Connection";

    fn segments() -> Vec<Segment> {
        hybrid_connection_segments()
    }

    fn from_parsed(parsed: &ParsedId) -> Self {
        Self {
            subscription_id: parsed.value("subscriptionId"),
            resource_group_name: parsed.value("resourceGroupName"),
            namespace_name: parsed.value("namespaceName"),
            hybrid_connection_name: parsed.value("hybridConnectionName"),
        }
    }

    fn id(&self) -> String {
        format!(
            "{}/hybridConnections/{}",
            self.namespace_id().id(),
            self.hybrid_connection_name
        )
    }
}

/// Authorization rule scoped to a hybrid connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HybridConnectionAuthorizationRuleId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub namespace_name: String,
    pub hybrid_connection_name: String,
    pub authorization_rule_name: String,
}

impl HybridConnectionAuthorizationRuleId {
    pub fn hybrid_connection_id(&self) -> HybridConnectionId {
        HybridConnectionId {
            subscription_id: self.subscription_id.clone(),
            resource_group_name: self.resource_group_name.clone(),
            namespace_name: self.namespace_name.clone(),
            hybrid_connection_name: self.hybrid_connection_name.clone(),
        }
    }
}

impl ResourceIdType for HybridConnectionAuthorizationRuleId {
    const DESCRIPTION: &'static str = "Relay Hybrid Connection Authorization Rule";

    fn segments() -> Vec<Segment> {
        with_authorization_rule(hybrid_connection_segments())
    }

    fn from_parsed(parsed: &ParsedId) -> Self {
        Self {
            subscription_id: parsed.value("subscriptionId"),
            resource_group_name: parsed.value("resourceGroupName"),
            namespace_name: parsed.value("namespaceName"),
            hybrid_connection_name: parsed.value("hybridConnectionName"),
            authorization_rule_name: parsed.value("authorizationRuleName"),
        }
    }

    fn id(&self) -> String {
        format!(
            "{}/authorizationRules/{}",
            self.hybrid_connection_id().id(),
            self.authorization_rule_name
        )
    }
}

impl_display!(
    NamespaceId,
    NamespaceAuthorizationRuleId,
    HybridConnectionId,
    HybridConnectionAuthorizationRuleId
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::resourceids::ParseError;

    const NAMESPACE: &str =
        "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/group1/providers/Microsoft.Relay/namespaces/relay1";

    #[test]
    fn namespace_id_round_trips() {
        let id = NamespaceId::parse(NAMESPACE).unwrap();
        assert_eq!(id.namespace_name, "relay1");
        assert_eq!(id.resource_group_name, "group1");
        assert_eq!(id.id(), NAMESPACE);
        assert_eq!(id.to_string(), NAMESPACE);
    }

    #[test]
    fn hybrid_connection_rule_id_round_trips() {
        let input = format!("{}/hybridConnections/hc1/authorizationRules/rule1", NAMESPACE);
        let id = HybridConnectionAuthorizationRuleId::parse(&input).unwrap();
        assert_eq!(id.hybrid_connection_name, "hc1");
        assert_eq!(id.authorization_rule_name, "rule1");
        assert_eq!(id.id(), input);
        assert_eq!(id.hybrid_connection_id().namespace_id().id(), NAMESPACE);
    }

    #[test]
    fn hybrid_connection_id_is_not_a_namespace_id() {
        let input = format!("{}/hybridConnections/hc1", NAMESPACE);
        assert!(matches!(
            NamespaceId::parse(&input),
            Err(ParseError::TrailingSegments { .. })
        ));
    }

    #[test]
    fn missing_hybrid_connection_segment_is_named() {
        let input = format!("{}/hybridConnections", NAMESPACE);
        match HybridConnectionId::parse(&input) {
            Err(ParseError::MissingSegment { segment, .. }) => {
                assert_eq!(segment, "hybridConnectionName")
            }
            other => panic!("Expected MissingSegment, got {:?}", other),
        }
    }

    #[test]
    fn api_casing_is_accepted_only_when_insensitive() {
        let input = "/subscriptions/sub/resourcegroups/group1/providers/microsoft.relay/namespaces/relay1/hybridconnections/HC1";
        assert!(HybridConnectionId::parse(input).is_err());

        let id = HybridConnectionId::parse_insensitively(input).unwrap();
        assert_eq!(id.resource_group_name, "group1");
        assert_eq!(id.hybrid_connection_name, "HC1");
        assert_eq!(
            id.id(),
            "/subscriptions/sub/resourceGroups/group1/providers/Microsoft.Relay/namespaces/relay1/hybridConnections/HC1"
        );
    }

    #[test]
    fn builders_nest_ids() {
        let ns = NamespaceId::new("sub", "rg", "ns");
        let rule = ns.hybrid_connection("hc").authorization_rule("r");
        assert_eq!(
            rule.id(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Relay/namespaces/ns/hybridConnections/hc/authorizationRules/r"
        );
        assert_eq!(
            ns.authorization_rule("RootManageSharedAccessKey").id(),
            format!("{}/authorizationRules/RootManageSharedAccessKey", ns.id())
        );
    }
}
