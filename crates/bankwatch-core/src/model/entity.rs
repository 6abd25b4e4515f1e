// ── Entity domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::entity_id::EntityId;
use super::metadata::Metadata;

/// The fixed set of hierarchy tiers.
///
/// Parsed from and rendered as the store's lowercase tags
/// (`customer`, `zone`, `nbg`, `ro`, `branch`, `device`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityType {
    Customer,
    Zone,
    Nbg,
    Ro,
    Branch,
    Device,
}

impl EntityType {
    /// Human-readable label used in headings and column titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Zone => "Zone",
            Self::Nbg => "NBG",
            Self::Ro => "RO",
            Self::Branch => "Branch",
            Self::Device => "Device",
        }
    }

    /// Tiers that may appear in a customer's configured level list.
    pub fn is_intermediate(self) -> bool {
        matches!(self, Self::Zone | Self::Nbg | Self::Ro | Self::Branch)
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, Self::Device)
    }
}

/// A single node of the organizational hierarchy, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub name: String,
    /// `None` only for customers.
    pub parent_id: Option<EntityId>,
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// An entity about to be inserted. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntity {
    pub entity_type: EntityType,
    pub name: String,
    pub parent_id: Option<EntityId>,
    pub metadata: Metadata,
}

/// A partial update. `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityUpdate {
    pub name: Option<String>,
    pub metadata: Option<Metadata>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn entity_type_parses_store_tags() {
        assert_eq!("nbg".parse::<EntityType>().unwrap(), EntityType::Nbg);
        assert_eq!("Branch".parse::<EntityType>().unwrap(), EntityType::Branch);
        assert!("region".parse::<EntityType>().is_err());
    }

    #[test]
    fn entity_type_display_matches_tag() {
        for t in EntityType::iter() {
            assert_eq!(t.to_string().parse::<EntityType>().unwrap(), t);
        }
        assert_eq!(EntityType::Ro.to_string(), "ro");
    }

    #[test]
    fn intermediate_tiers() {
        let intermediate: Vec<_> = EntityType::iter().filter(|t| t.is_intermediate()).collect();
        assert_eq!(
            intermediate,
            vec![
                EntityType::Zone,
                EntityType::Nbg,
                EntityType::Ro,
                EntityType::Branch
            ]
        );
    }
}
