// ── Per-customer hierarchy shape ──

use serde::{Deserialize, Serialize};

use super::entity::EntityType;
use super::entity_id::EntityId;
use crate::error::CoreError;

/// Ordered intermediate tiers between a customer and its devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub customer_id: EntityId,
    pub levels: Vec<EntityType>,
}

impl HierarchyConfig {
    /// The shape new customers get unless told otherwise.
    pub const DEFAULT_LEVELS: [EntityType; 2] = [EntityType::Zone, EntityType::Branch];

    pub fn new(customer_id: EntityId, levels: Vec<EntityType>) -> Result<Self, CoreError> {
        validate_levels(&levels)?;
        Ok(Self {
            customer_id,
            levels,
        })
    }

    /// Position of a tier in this customer's level list.
    pub fn position(&self, entity_type: EntityType) -> Option<usize> {
        self.levels.iter().position(|l| *l == entity_type)
    }
}

/// Parse level labels as stored (`["zone", "nbg", "ro", "branch"]`).
pub fn parse_levels<S: AsRef<str>>(labels: &[S]) -> Result<Vec<EntityType>, CoreError> {
    let levels = labels
        .iter()
        .map(|raw| {
            let raw = raw.as_ref().trim();
            raw.parse::<EntityType>()
                .map_err(|_| CoreError::ValidationFailed {
                    message: format!("unknown hierarchy level '{raw}'"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    validate_levels(&levels)?;
    Ok(levels)
}

/// Levels must be distinct intermediate tiers.
pub fn validate_levels(levels: &[EntityType]) -> Result<(), CoreError> {
    for (i, level) in levels.iter().enumerate() {
        if !level.is_intermediate() {
            return Err(CoreError::ValidationFailed {
                message: format!("'{level}' cannot be an intermediate hierarchy level"),
            });
        }
        if levels[..i].contains(level) {
            return Err(CoreError::ValidationFailed {
                message: format!("hierarchy level '{level}' listed more than once"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_tier_shape() {
        let levels = parse_levels(&["zone", "nbg", "ro", "branch"]).unwrap();
        assert_eq!(
            levels,
            vec![
                EntityType::Zone,
                EntityType::Nbg,
                EntityType::Ro,
                EntityType::Branch
            ]
        );
    }

    #[test]
    fn rejects_labels_outside_tier_set() {
        let err = parse_levels(&["region", "branch"]).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }

    #[test]
    fn rejects_terminal_tiers() {
        assert!(parse_levels(&["zone", "device"]).is_err());
        assert!(parse_levels(&["customer"]).is_err());
    }

    #[test]
    fn rejects_duplicates() {
        assert!(parse_levels(&["zone", "zone"]).is_err());
    }

    #[test]
    fn empty_level_list_is_valid() {
        assert!(parse_levels::<&str>(&[]).unwrap().is_empty());
    }
}
