// Wire types for the entity store's tables.
//
// These mirror the rows exactly as the REST layer returns them. Typed
// interpretation (entity kinds, metadata variants) happens in
// `bankwatch-core::convert`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row of the generic `entities` adjacency-list table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    pub id: String,
    pub entity_type: String,
    pub entity_name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Open, type-dependent JSON object. `null` in older rows.
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for `entities`. The store assigns id and timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct NewEntityRow {
    pub entity_name: String,
    pub entity_type: String,
    /// Serialized even when `None`: customers are inserted with an explicit null parent.
    pub parent_id: Option<String>,
    pub metadata: Value,
}

/// Partial update payload for `entities`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl EntityPatch {
    pub fn is_empty(&self) -> bool {
        self.entity_name.is_none() && self.metadata.is_none()
    }
}

/// A row of `hierarchy_configs`: the ordered intermediate levels of one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyConfigRow {
    #[serde(default)]
    pub id: Option<String>,
    pub customer_id: String,
    #[serde(default)]
    pub hierarchy_levels: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for `hierarchy_configs`.
#[derive(Debug, Clone, Serialize)]
pub struct NewHierarchyConfigRow {
    pub customer_id: String,
    pub hierarchy_levels: Vec<String>,
}

/// A row of `profiles`, linking an identity-provider user to a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}
