// ── Children-table columns ──
//
// Which columns the children table of a node shows depends only on the
// node's tier and its customer's hierarchy config.

use serde::Serialize;
use strum::Display;

use super::builder::HierarchyNode;
use super::derive::next_child_type;
use crate::model::{EntityType, HierarchyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnKey {
    Name,
    Type,
    IpAddress,
    Status,
    LastActive,
    ChildCount,
    Location,
    Manager,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: ColumnKey,
    pub label: String,
    pub sortable: bool,
}

impl Column {
    fn new(key: ColumnKey, label: impl Into<String>, sortable: bool) -> Self {
        Self {
            key,
            label: label.into(),
            sortable,
        }
    }
}

/// Columns for the children table of a node of `parent_type`.
///
/// Device listings (children are devices, or the node is itself a
/// device) get the device columns; every other level gets a name
/// column titled after the child tier, a count, location, and manager.
pub fn table_columns(parent_type: EntityType, config: Option<&HierarchyConfig>) -> Vec<Column> {
    let child_type = next_child_type(parent_type, config);

    match child_type {
        None | Some(EntityType::Device) => vec![
            Column::new(ColumnKey::Name, "Name", true),
            Column::new(ColumnKey::Type, "Type", true),
            Column::new(ColumnKey::IpAddress, "IP Address", false),
            Column::new(ColumnKey::Status, "Status", true),
            Column::new(ColumnKey::LastActive, "Last Active", true),
        ],
        Some(child) => {
            let count_label = if next_child_type(child, config) == Some(EntityType::Device) {
                "Devices"
            } else {
                "Children"
            };
            vec![
                Column::new(ColumnKey::Name, format!("{} Name", child.label()), true),
                Column::new(ColumnKey::ChildCount, count_label, true),
                Column::new(ColumnKey::Location, "Location", false),
                Column::new(ColumnKey::Manager, "Manager", false),
            ]
        }
    }
}

/// Render one cell as text. Missing values render as an empty string.
pub fn column_value(node: &HierarchyNode, key: ColumnKey) -> String {
    let meta = &node.entity.metadata;
    let device = meta.as_device();

    match key {
        ColumnKey::Name => node.name().to_owned(),
        ColumnKey::Type => meta
            .kind_label()
            .unwrap_or_else(|| node.entity_type().label().to_owned()),
        ColumnKey::IpAddress => device
            .and_then(|d| d.ip_address.clone())
            .unwrap_or_default(),
        ColumnKey::Status => device
            .map(|d| d.status.unwrap_or_default().to_string())
            .unwrap_or_default(),
        ColumnKey::LastActive => device
            .and_then(|d| d.last_active.clone())
            .unwrap_or_default(),
        ColumnKey::ChildCount => node.child_count.to_string(),
        ColumnKey::Location => meta.location().unwrap_or_default(),
        ColumnKey::Manager => meta.manager().map(str::to_owned).unwrap_or_default(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Entity, EntityId, Metadata};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn labels(cols: &[Column]) -> Vec<&str> {
        cols.iter().map(|c| c.label.as_str()).collect()
    }

    fn node(entity_type: EntityType, name: &str, meta: serde_json::Value) -> HierarchyNode {
        HierarchyNode {
            entity: Arc::new(Entity {
                id: EntityId::from("x"),
                entity_type,
                name: name.into(),
                parent_id: None,
                metadata: Metadata::from_value(entity_type, Some(meta)),
                created_at: None,
                updated_at: None,
            }),
            children: Vec::new(),
            child_count: 0,
            level: 0,
        }
    }

    #[test]
    fn customer_columns_with_two_tier_config() {
        let cfg = HierarchyConfig::new(
            EntityId::from("c1"),
            vec![EntityType::Zone, EntityType::Branch],
        )
        .unwrap();
        let cols = table_columns(EntityType::Customer, Some(&cfg));
        assert_eq!(
            labels(&cols),
            vec!["Zone Name", "Children", "Location", "Manager"]
        );

        let cols = table_columns(EntityType::Zone, Some(&cfg));
        assert_eq!(
            labels(&cols),
            vec!["Branch Name", "Devices", "Location", "Manager"]
        );
    }

    #[test]
    fn device_listing_columns() {
        let expected = vec!["Name", "Type", "IP Address", "Status", "Last Active"];
        assert_eq!(labels(&table_columns(EntityType::Branch, None)), expected);
        assert_eq!(labels(&table_columns(EntityType::Device, None)), expected);
    }

    #[test]
    fn nbg_columns_without_config() {
        let cols = table_columns(EntityType::Nbg, None);
        assert_eq!(cols[0].label, "RO Name");
        assert_eq!(cols[1].label, "Children");
    }

    #[test]
    fn device_cells() {
        let n = node(
            EntityType::Device,
            "ATM-1",
            json!({ "type": "ATM", "status": "online", "ip_address": "10.1.1.5" }),
        );
        assert_eq!(column_value(&n, ColumnKey::Type), "ATM");
        assert_eq!(column_value(&n, ColumnKey::Status), "online");
        assert_eq!(column_value(&n, ColumnKey::IpAddress), "10.1.1.5");
        assert_eq!(column_value(&n, ColumnKey::LastActive), "");
    }

    #[test]
    fn org_unit_cells() {
        let n = node(
            EntityType::Branch,
            "Andheri",
            json!({ "manager": "P. Rao", "city": "Mumbai", "country": "India" }),
        );
        assert_eq!(column_value(&n, ColumnKey::Manager), "P. Rao");
        assert_eq!(column_value(&n, ColumnKey::Location), "Mumbai, India");
        assert_eq!(column_value(&n, ColumnKey::ChildCount), "0");
        assert_eq!(column_value(&n, ColumnKey::Type), "Branch");
    }
}
