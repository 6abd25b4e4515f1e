// ── Typed request structs for Command payloads ──

use serde::{Deserialize, Serialize};

use crate::model::{EntityId, EntityType, HierarchyConfig, Metadata};

/// Add a child under an existing entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEntityRequest {
    pub parent_id: EntityId,
    pub entity_type: EntityType,
    pub name: String,
    pub metadata: Metadata,
}

/// Add a top-level customer together with its hierarchy shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub metadata: Metadata,
    /// Intermediate tiers. Defaults to zone → branch.
    #[serde(default = "default_levels")]
    pub levels: Vec<EntityType>,
}

fn default_levels() -> Vec<EntityType> {
    HierarchyConfig::DEFAULT_LEVELS.to_vec()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl UpdateEntityRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.metadata.is_none()
    }
}
