// ── API-to-domain type conversions ──
//
// Bridges the raw `bankwatch_api` row types and the typed domain model.
// Store rows are loosely typed (`entity_type` is free text, metadata is
// an open object); everything is normalized here, once.

use std::str::FromStr;

use tracing::warn;

use bankwatch_api::{
    EntityPatch, EntityRow, HierarchyConfigRow, NewEntityRow, NewHierarchyConfigRow, ProfileRow,
};

use crate::error::CoreError;
use crate::model::hierarchy_config::parse_levels;
use crate::model::{
    Entity, EntityId, EntityType, EntityUpdate, HierarchyConfig, Metadata, NewEntity, Role,
    UserContext,
};

// ── Rows → domain ──────────────────────────────────────────────────

impl TryFrom<EntityRow> for Entity {
    type Error = CoreError;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        let entity_type =
            EntityType::from_str(&row.entity_type).map_err(|_| CoreError::ValidationFailed {
                message: format!(
                    "entity {} has unknown entity_type '{}'",
                    row.id, row.entity_type
                ),
            })?;

        Ok(Self {
            id: EntityId::from(row.id),
            entity_type,
            name: row.entity_name,
            parent_id: row.parent_id.map(EntityId::from),
            metadata: Metadata::from_value(entity_type, row.metadata),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a batch of rows, skipping (and logging) rows of unknown tiers.
pub(crate) fn entities_from_rows(rows: Vec<EntityRow>) -> Vec<Entity> {
    rows.into_iter()
        .filter_map(|row| match Entity::try_from(row) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(error = %e, "skipping entity row");
                None
            }
        })
        .collect()
}

impl TryFrom<HierarchyConfigRow> for HierarchyConfig {
    type Error = CoreError;

    fn try_from(row: HierarchyConfigRow) -> Result<Self, Self::Error> {
        Ok(Self {
            levels: parse_levels(&row.hierarchy_levels)?,
            customer_id: EntityId::from(row.customer_id),
        })
    }
}

/// Convert hierarchy configs. Invalid level lists are dropped with a
/// warning, so the customer falls back to the default tier map.
pub(crate) fn configs_from_rows(rows: Vec<HierarchyConfigRow>) -> Vec<HierarchyConfig> {
    rows.into_iter()
        .filter_map(|row| {
            let customer = row.customer_id.clone();
            match HierarchyConfig::try_from(row) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    warn!(%customer, error = %e, "ignoring hierarchy config");
                    None
                }
            }
        })
        .collect()
}

impl From<ProfileRow> for UserContext {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: row.user_id,
            display_name: row.display_name,
            role: Role::from_claim(row.role.as_deref()),
            customer_id: row.customer_id.map(EntityId::from),
        }
    }
}

// ── Domain → rows ──────────────────────────────────────────────────

impl From<&NewEntity> for NewEntityRow {
    fn from(e: &NewEntity) -> Self {
        Self {
            entity_name: e.name.clone(),
            entity_type: e.entity_type.to_string(),
            parent_id: e.parent_id.as_ref().map(ToString::to_string),
            metadata: e.metadata.to_value(),
        }
    }
}

impl From<&EntityUpdate> for EntityPatch {
    fn from(u: &EntityUpdate) -> Self {
        Self {
            entity_name: u.name.clone(),
            metadata: u.metadata.as_ref().map(Metadata::to_value),
        }
    }
}

impl From<&HierarchyConfig> for NewHierarchyConfigRow {
    fn from(c: &HierarchyConfig) -> Self {
        Self {
            customer_id: c.customer_id.to_string(),
            hierarchy_levels: c.levels.iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(id: &str, t: &str, parent: Option<&str>) -> EntityRow {
        EntityRow {
            id: id.into(),
            entity_type: t.into(),
            entity_name: format!("{t} {id}"),
            parent_id: parent.map(Into::into),
            metadata: Some(json!({ "code": "X1" })),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn entity_row_converts() {
        let e = Entity::try_from(row("z1", "zone", Some("c1"))).unwrap();
        assert_eq!(e.entity_type, EntityType::Zone);
        assert_eq!(e.parent_id, Some(EntityId::from("c1")));
        assert_eq!(e.metadata.get("code").as_deref(), Some("X1"));
    }

    #[test]
    fn unknown_tier_rows_are_skipped() {
        let entities = entities_from_rows(vec![
            row("c1", "customer", None),
            row("r1", "region", Some("c1")),
        ]);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn invalid_config_rows_are_dropped() {
        let configs = configs_from_rows(vec![
            HierarchyConfigRow {
                id: None,
                customer_id: "c1".into(),
                hierarchy_levels: vec!["zone".into(), "branch".into()],
                created_at: None,
                updated_at: None,
            },
            HierarchyConfigRow {
                id: None,
                customer_id: "c2".into(),
                hierarchy_levels: vec!["division".into(), "region".into()],
                created_at: None,
                updated_at: None,
            },
        ]);
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].customer_id, EntityId::from("c1"));
    }

    #[test]
    fn new_entity_row_carries_metadata_object() {
        let mut metadata = Metadata::empty(EntityType::Device);
        metadata.set(EntityType::Device, "type", "ATM");
        let new = NewEntity {
            entity_type: EntityType::Device,
            name: "ATM-7".into(),
            parent_id: Some(EntityId::from("b1")),
            metadata,
        };
        let row = NewEntityRow::from(&new);
        assert_eq!(row.entity_type, "device");
        assert_eq!(row.parent_id.as_deref(), Some("b1"));
        assert_eq!(row.metadata, json!({ "type": "ATM" }));
    }

    #[test]
    fn profile_row_to_user_context() {
        let user = UserContext::from(ProfileRow {
            id: None,
            user_id: "u1".into(),
            display_name: Some("Asha".into()),
            role: Some("customer_admin".into()),
            customer_id: Some("c1".into()),
        });
        assert_eq!(user.role, Role::CustomerAdmin);
        assert_eq!(user.customer_id, Some(EntityId::from("c1")));
    }
}
