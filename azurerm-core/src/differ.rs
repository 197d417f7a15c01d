//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared in configuration with the "current
//! state" fetched from the Provider, and generates the list of Effects
//! required to converge them.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute changed -> delete and recreate
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let desired_attrs = match schema {
        Some(schema) => schema.with_defaults(&desired.attributes),
        None => desired.attributes.clone(),
    };
    let changed = find_changed_attributes(&desired_attrs, &current.attributes, schema);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let replace = schema.is_some_and(|s| changed.iter().any(|name| s.is_force_new(name)));
    if replace {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        if schema.is_some_and(|s| s.is_read_only(key)) {
            continue;
        }

        let equal = match (current.get(key), schema) {
            (Some(current_value), Some(schema)) => {
                schema.normalize_value(key, current_value)
                    == schema.normalize_value(key, desired_value)
            }
            (Some(current_value), None) => current_value == desired_value,
            (None, _) => false,
        };
        if !equal {
            changed.push(key.clone());
        }
    }

    // Optional attributes dropped from the configuration must be cleared
    if let Some(schema) = schema {
        for (key, attribute) in &schema.attributes {
            if !attribute.optional || attribute.computed || desired.contains_key(key) {
                continue;
            }
            if current.get(key).is_some_and(|v| !is_empty_value(v)) {
                changed.push(key.clone());
            }
        }
    }

    changed.sort();
    changed
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        Value::Int(_) | Value::Bool(_) => false,
    }
}

/// Compute Diff for multiple resources and generate a Plan
///
/// `desired` must already be in dependency order. Resources that are present
/// in `current_states` but no longer declared are deleted, highest `rank`
/// first, after all other effects.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
    rank: impl Fn(&str) -> usize,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        if resource.is_data_source() {
            plan.add(Effect::Read(resource.clone()));
            continue;
        }

        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        let schema = schemas.get(&resource.id.resource_type);
        match diff(resource, &current, schema) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update {
                id,
                from,
                to,
                changed_attributes,
            } => plan.add(Effect::Update {
                identifier: from.identifier.clone().unwrap_or_default(),
                id,
                from,
                to,
                changed_attributes,
            }),
            Diff::Replace {
                id,
                from,
                to,
                changed_attributes,
            } => plan.add(Effect::Replace {
                identifier: from.identifier.clone().unwrap_or_default(),
                id,
                from,
                to,
                changed_attributes,
            }),
            Diff::NoChange(_) => {}
        }
    }

    let declared: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    let mut orphans: Vec<&State> = current_states
        .values()
        .filter(|s| s.exists && !declared.contains(&s.id))
        .collect();
    orphans.sort_by(|a, b| {
        rank(&b.id.resource_type)
            .cmp(&rank(&a.id.resource_type))
            .then_with(|| a.id.cmp(&b.id))
    });
    for state in orphans {
        if let Some(identifier) = &state.identifier {
            plan.add(Effect::Delete {
                id: state.id.clone(),
                identifier: identifier.clone(),
            });
        }
    }

    plan
}
