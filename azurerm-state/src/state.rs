//! Persisted state file

use std::collections::{BTreeMap, HashMap};

use azurerm_core::resource::{ResourceId, State, Value};
use serde::{Deserialize, Serialize};

/// The document written by a state backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    /// Bumped on every write
    pub serial: u64,
    /// Fixed for the life of a deployment; a backend refuses to overwrite
    /// state carrying a different lineage
    pub lineage: String,
    pub tool_version: String,
    pub resources: Vec<ResourceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.tool_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == id.resource_type && r.name == id.name)
    }

    /// Record a resource, replacing any earlier entry for the same id
    pub fn upsert(&mut self, resource: ResourceState) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    pub fn remove(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let index = self
            .resources
            .iter()
            .position(|r| r.resource_type == id.resource_type && r.name == id.name)?;
        Some(self.resources.remove(index))
    }

    /// Apply the outcome of an operation: existing states are recorded, a
    /// state that no longer exists is dropped
    pub fn record(&mut self, state: &State, provider: &str) {
        if state.exists {
            self.upsert(ResourceState::from_state(state, provider));
        } else {
            self.remove(&state.id);
        }
    }

    /// Recorded states keyed by resource id, as input for planning
    pub fn states(&self) -> HashMap<ResourceId, State> {
        self.resources
            .iter()
            .map(|r| {
                let state = r.to_state();
                (state.id.clone(), state)
            })
            .collect()
    }
}

/// One managed resource as recorded in the state file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource_type: String,
    pub name: String,
    pub provider: String,
    /// ARM resource ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn from_state(state: &State, provider: &str) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.to_string(),
            identifier: state.identifier.clone(),
            attributes: state
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        }
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    pub fn to_state(&self) -> State {
        let attributes = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        let state = State::existing(self.id(), attributes);
        match &self.identifier {
            Some(identifier) => state.with_identifier(identifier),
            None => state,
        }
    }
}
