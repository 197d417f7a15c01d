//! Configuration file loading

use std::collections::{HashMap, HashSet};
use std::path::Path;

use azurerm_core::context::TimeoutOverrides;
use azurerm_core::resource::{Resource, Value};
use azurerm_provider::ProviderConfig;
use azurerm_state::BackendConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub resources: Vec<ResourceBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceBlock {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub data_source: bool,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub timeouts: HashMap<String, String>,
}

impl ResourceBlock {
    fn to_resource(&self) -> Result<Resource, String> {
        let timeouts = TimeoutOverrides::parse(&self.timeouts)
            .map_err(|e| format!("{}.{}: {}", self.resource_type, self.name, e))?;
        let mut resource = Resource::new(&self.resource_type, &self.name)
            .with_read_only(self.data_source)
            .with_timeouts(timeouts);
        for (key, value) in &self.attributes {
            if let Some(value) = Value::from_json(value) {
                resource.attributes.insert(key.clone(), value);
            }
        }
        Ok(resource)
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))
    }

    /// Declared resources; `(type, name)` must be unique per kind
    pub fn resources(&self) -> Result<Vec<Resource>, String> {
        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(self.resources.len());
        for block in &self.resources {
            if !seen.insert((block.data_source, &block.resource_type, &block.name)) {
                return Err(format!(
                    "Duplicate resource {}.{}",
                    block.resource_type, block.name
                ));
            }
            resources.push(block.to_resource()?);
        }
        Ok(resources)
    }
}
