//! Typed client for the Microsoft.Relay management API

use crate::arm::resourceids::ResourceIdType;
use crate::arm::{ArmClient, ArmError};

use super::ids::{
    HybridConnectionAuthorizationRuleId, HybridConnectionId, NamespaceAuthorizationRuleId,
    NamespaceId,
};
use super::models::{API_VERSION, AccessKeys, AuthorizationRule, HybridConnection, RelayNamespace};

#[derive(Clone)]
pub struct RelayClient {
    arm: ArmClient,
}

impl RelayClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    // Namespaces

    pub async fn get_namespace(&self, id: &NamespaceId) -> Result<RelayNamespace, ArmError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    pub async fn create_or_update_namespace(
        &self,
        id: &NamespaceId,
        namespace: &RelayNamespace,
    ) -> Result<RelayNamespace, ArmError> {
        self.arm.put(&id.id(), API_VERSION, namespace).await
    }

    pub async fn delete_namespace(&self, id: &NamespaceId) -> Result<(), ArmError> {
        self.arm.delete(&id.id(), API_VERSION).await
    }

    // Namespace authorization rules

    pub async fn get_namespace_authorization_rule(
        &self,
        id: &NamespaceAuthorizationRuleId,
    ) -> Result<AuthorizationRule, ArmError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    pub async fn create_or_update_namespace_authorization_rule(
        &self,
        id: &NamespaceAuthorizationRuleId,
        rule: &AuthorizationRule,
    ) -> Result<AuthorizationRule, ArmError> {
        self.arm.put(&id.id(), API_VERSION, rule).await
    }

    pub async fn delete_namespace_authorization_rule(
        &self,
        id: &NamespaceAuthorizationRuleId,
    ) -> Result<(), ArmError> {
        self.arm.delete(&id.id(), API_VERSION).await
    }

    pub async fn list_namespace_keys(
        &self,
        id: &NamespaceAuthorizationRuleId,
    ) -> Result<AccessKeys, ArmError> {
        self.arm
            .post(&format!("{}/listKeys", id.id()), API_VERSION)
            .await
    }

    // Hybrid connections

    pub async fn get_hybrid_connection(
        &self,
        id: &HybridConnectionId,
    ) -> Result<HybridConnection, ArmError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    pub async fn create_or_update_hybrid_connection(
        &self,
        id: &HybridConnectionId,
        hybrid_connection: &HybridConnection,
    ) -> Result<HybridConnection, ArmError> {
        self.arm.put(&id.id(), API_VERSION, hybrid_connection).await
    }

    pub async fn delete_hybrid_connection(&self, id: &HybridConnectionId) -> Result<(), ArmError> {
        self.arm.delete(&id.id(), API_VERSION).await
    }

    pub async fn list_hybrid_connections(
        &self,
        namespace: &NamespaceId,
    ) -> Result<Vec<HybridConnection>, ArmError> {
        self.arm
            .list_all(&format!("{}/hybridConnections", namespace.id()), API_VERSION)
            .await
    }

    // Hybrid connection authorization rules

    pub async fn get_hybrid_connection_authorization_rule(
        &self,
        id: &HybridConnectionAuthorizationRuleId,
    ) -> Result<AuthorizationRule, ArmError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    pub async fn create_or_update_hybrid_connection_authorization_rule(
        &self,
        id: &HybridConnectionAuthorizationRuleId,
        rule: &AuthorizationRule,
    ) -> Result<AuthorizationRule, ArmError> {
        self.arm.put(&id.id(), API_VERSION, rule).await
    }

    pub async fn delete_hybrid_connection_authorization_rule(
        &self,
        id: &HybridConnectionAuthorizationRuleId,
    ) -> Result<(), ArmError> {
        self.arm.delete(&id.id(), API_VERSION).await
    }

    pub async fn list_hybrid_connection_keys(
        &self,
        id: &HybridConnectionAuthorizationRuleId,
    ) -> Result<AccessKeys, ArmError> {
        self.arm
            .post(&format!("{}/listKeys", id.id()), API_VERSION)
            .await
    }
}
