// ── Type-driven child-type derivation ──

use crate::model::{EntityType, HierarchyConfig};

/// The tier a node's children belong to.
///
/// With a config: customer → first level (or device when the list is
/// empty), a configured level → the next one (device after the last),
/// device → none, anything not in the list → none.
///
/// Without a config the fixed default map applies.
pub fn next_child_type(
    entity_type: EntityType,
    config: Option<&HierarchyConfig>,
) -> Option<EntityType> {
    let Some(config) = config else {
        return static_child_type(entity_type);
    };

    match entity_type {
        EntityType::Device => None,
        EntityType::Customer => Some(config.levels.first().copied().unwrap_or(EntityType::Device)),
        other => {
            let pos = config.position(other)?;
            Some(
                config
                    .levels
                    .get(pos + 1)
                    .copied()
                    .unwrap_or(EntityType::Device),
            )
        }
    }
}

fn static_child_type(entity_type: EntityType) -> Option<EntityType> {
    match entity_type {
        EntityType::Customer => Some(EntityType::Zone),
        EntityType::Zone | EntityType::Ro => Some(EntityType::Branch),
        EntityType::Nbg => Some(EntityType::Ro),
        EntityType::Branch => Some(EntityType::Device),
        EntityType::Device => None,
    }
}

/// Metadata keys worth showing for a tier, in display order.
///
/// Static: independent of what a given entity actually carries.
pub fn display_fields(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Customer => &["type", "country", "city", "description"],
        EntityType::Zone | EntityType::Nbg | EntityType::Ro | EntityType::Branch => &[
            "code",
            "manager",
            "address",
            "city",
            "country",
            "description",
        ],
        EntityType::Device => &[
            "type",
            "status",
            "ip_address",
            "location",
            "last_active",
            "version",
            "description",
        ],
    }
}
