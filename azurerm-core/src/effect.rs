//! Effect - A single change to be applied by a Provider

use crate::resource::{Resource, ResourceId, State};

/// Side effect described as a value; nothing happens until it is applied
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Refresh a data source
    Read(Resource),
    Create(Resource),
    Update {
        id: ResourceId,
        identifier: String,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete and recreate because a force-new attribute changed
    Replace {
        id: ResourceId,
        identifier: String,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    Delete {
        id: ResourceId,
        identifier: String,
    },
}

impl Effect {
    /// Returns whether this Effect modifies remote infrastructure
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } | Effect::Delete { id, .. } => {
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_not_mutating() {
        let read = Effect::Read(Resource::new("relay_namespace", "lookup").with_read_only(true));
        let delete = Effect::Delete {
            id: ResourceId::new("relay_namespace", "old"),
            identifier: "/subscriptions/x".to_string(),
        };
        assert!(!read.is_mutating());
        assert!(delete.is_mutating());
        assert_eq!(delete.resource_id().name, "old");
    }
}
