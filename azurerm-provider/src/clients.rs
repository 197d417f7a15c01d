//! Client bundle handed to every resource handler

use std::sync::Arc;
use std::time::Duration;

use crate::arm::{ArmClient, ArmError, ClientSecretCredential, StaticToken, TokenCredential};
use crate::config::{ConfigError, ProviderConfig};
use crate::relay::client::RelayClient;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("building ARM client: {0}")]
    Arm(#[from] ArmError),
}

#[derive(Clone)]
pub struct Clients {
    pub subscription_id: String,
    pub delete_poll_interval: Duration,
    pub relay: RelayClient,
}

impl Clients {
    pub fn new(config: &ProviderConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let http = ArmClient::http_client()?;
        let credential: Arc<dyn TokenCredential> = match &config.access_token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(ClientSecretCredential::new(
                http.clone(),
                config.authority_host(),
                config.tenant_id.as_deref().unwrap_or_default(),
                config.client_id.clone().unwrap_or_default(),
                config.client_secret.clone().unwrap_or_default(),
                config.endpoint(),
            )?),
        };

        let arm = ArmClient::new(http, config.endpoint(), credential)?;
        Ok(Self::from_arm(
            config.subscription_id(),
            config.delete_poll_interval()?,
            arm,
        ))
    }

    pub fn from_arm(
        subscription_id: impl Into<String>,
        delete_poll_interval: Duration,
        arm: ArmClient,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            delete_poll_interval,
            relay: RelayClient::new(arm),
        }
    }
}
