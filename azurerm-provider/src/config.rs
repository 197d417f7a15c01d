//! Provider configuration
//!
//! Values come from the `provider` block of the configuration file, with
//! `ARM_*` environment variables filling in whatever the file leaves out.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::arm::client::DEFAULT_ENDPOINT;
use crate::wait::DEFAULT_DELETE_POLL_INTERVAL;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com/";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("subscription_id is required (set it in the provider block or ARM_SUBSCRIPTION_ID)")]
    MissingSubscription,

    #[error(
        "credentials are required: set access_token (ARM_ACCESS_TOKEN) or tenant_id, client_id and client_secret"
    )]
    MissingCredentials,

    #[error("invalid {field} {value:?}: {message}")]
    InvalidValue {
        field: &'static str,
        value: String,
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub resource_manager_endpoint: Option<String>,
    pub authority_host: Option<String>,
    /// humantime duration, e.g. "15s"
    pub delete_poll_interval: Option<String>,
}

impl ProviderConfig {
    /// Fill unset fields from the process environment
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from `lookup`; explicit values win
    pub fn with_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fill = |slot: &mut Option<String>, key: &str| {
            if slot.is_none() {
                *slot = lookup(key).filter(|v| !v.is_empty());
            }
        };
        fill(&mut self.subscription_id, "ARM_SUBSCRIPTION_ID");
        fill(&mut self.tenant_id, "ARM_TENANT_ID");
        fill(&mut self.client_id, "ARM_CLIENT_ID");
        fill(&mut self.client_secret, "ARM_CLIENT_SECRET");
        fill(&mut self.access_token, "ARM_ACCESS_TOKEN");
        fill(&mut self.resource_manager_endpoint, "ARM_ENDPOINT");
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subscription_id.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingSubscription);
        }
        let has_token = self.access_token.is_some();
        let has_secret =
            self.tenant_id.is_some() && self.client_id.is_some() && self.client_secret.is_some();
        if !has_token && !has_secret {
            return Err(ConfigError::MissingCredentials);
        }
        for (field, value) in [
            ("resource_manager_endpoint", &self.resource_manager_endpoint),
            ("authority_host", &self.authority_host),
        ] {
            if let Some(value) = value {
                url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                    field,
                    value: value.clone(),
                    message: e.to_string(),
                })?;
            }
        }
        self.delete_poll_interval()?;
        Ok(())
    }

    pub fn subscription_id(&self) -> &str {
        self.subscription_id.as_deref().unwrap_or_default()
    }

    pub fn endpoint(&self) -> &str {
        self.resource_manager_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn authority_host(&self) -> &str {
        self.authority_host
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORITY_HOST)
    }

    pub fn delete_poll_interval(&self) -> Result<Duration, ConfigError> {
        match &self.delete_poll_interval {
            None => Ok(DEFAULT_DELETE_POLL_INTERVAL),
            Some(raw) => humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidValue {
                field: "delete_poll_interval",
                value: raw.clone(),
                message: e.to_string(),
            }),
        }
    }
}
