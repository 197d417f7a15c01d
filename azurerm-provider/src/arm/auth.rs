//! Bearer token acquisition for Azure Resource Manager

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use url::Url;

use super::error::{ArmError, truncate};

/// Refresh tokens this long before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Source of bearer tokens for ARM requests
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<String, ArmError>;
}

/// A pre-acquired token, e.g. from `ARM_ACCESS_TOKEN`
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenCredential for StaticToken {
    async fn token(&self) -> Result<String, ArmError> {
        Ok(self.0.clone())
    }
}

struct CachedToken {
    token: String,
    /// Expiry with buffer applied
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth2 client credentials flow against Microsoft Entra ID
pub struct ClientSecretCredential {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: RwLock<Option<CachedToken>>,
}

impl ClientSecretCredential {
    pub fn new(
        http: reqwest::Client,
        authority_host: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        resource_manager_endpoint: &str,
    ) -> Result<Self, ArmError> {
        let token_url =
            Url::parse(authority_host)?.join(&format!("{}/oauth2/v2.0/token", tenant_id))?;
        Ok(Self {
            http,
            token_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: format!("{}/.default", resource_manager_endpoint.trim_end_matches('/')),
            cache: RwLock::new(None),
        })
    }

    async fn fetch(&self) -> Result<CachedToken, ArmError> {
        tracing::debug!("POST {}", self.token_url);

        let response = self
            .http
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ArmError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                truncate(&body)
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        let lifetime = Duration::from_secs(parsed.expires_in.unwrap_or(3600));
        Ok(CachedToken {
            token: parsed.access_token,
            expires_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_BUFFER),
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<String, ArmError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
                return Ok(cached.token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref().filter(|c| c.is_valid()) {
            return Ok(cached.token.clone());
        }

        let fresh = self.fetch().await?;
        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            fresh.expires_at.saturating_duration_since(Instant::now()).as_secs() / 60
        );
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}
