// ── Children table view ──
//
// Search and tri-state sorting over the children of one node.

use std::cmp::Ordering;

use serde::Serialize;

use super::builder::HierarchyNode;
use super::columns::{Column, ColumnKey, column_value, table_columns};
use crate::model::HierarchyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub key: ColumnKey,
    pub direction: SortDirection,
}

/// A searchable, sortable listing of a node's children.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    columns: Vec<Column>,
    rows: &'a [HierarchyNode],
    search: String,
    sort: Option<SortState>,
}

impl<'a> TableView<'a> {
    pub fn new(parent: &'a HierarchyNode, config: Option<&HierarchyConfig>) -> Self {
        Self {
            columns: table_columns(parent.entity_type(), config),
            rows: &parent.children,
            search: String::new(),
            sort: None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Advance the sort on `key`: none → ascending → descending → none.
    /// Selecting a different column starts over at ascending.
    ///
    /// Returns `false` (and changes nothing) for unknown or unsortable columns.
    pub fn toggle_sort(&mut self, key: ColumnKey) -> bool {
        if !self.is_sortable(key) {
            return false;
        }
        self.sort = match self.sort {
            Some(SortState {
                key: current,
                direction: SortDirection::Ascending,
            }) if current == key => Some(SortState {
                key,
                direction: SortDirection::Descending,
            }),
            Some(SortState {
                key: current,
                direction: SortDirection::Descending,
            }) if current == key => None,
            _ => Some(SortState {
                key,
                direction: SortDirection::Ascending,
            }),
        };
        true
    }

    fn is_sortable(&self, key: ColumnKey) -> bool {
        self.columns.iter().any(|c| c.key == key && c.sortable)
    }

    /// Total rows before searching.
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// Matching rows in display order.
    pub fn rows(&self) -> Vec<&'a HierarchyNode> {
        let needle = self.search.trim().to_lowercase();
        let mut rows: Vec<&'a HierarchyNode> = self
            .rows
            .iter()
            .filter(|node| {
                needle.is_empty()
                    || self
                        .columns
                        .iter()
                        .any(|c| column_value(node, c.key).to_lowercase().contains(&needle))
            })
            .collect();

        if let Some(sort) = self.sort {
            rows.sort_by(|a, b| {
                let ord = compare_cells(a, b, sort.key);
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    /// Matching rows rendered as text, one entry per column.
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows()
            .into_iter()
            .map(|node| {
                self.columns
                    .iter()
                    .map(|c| column_value(node, c.key))
                    .collect()
            })
            .collect()
    }
}

fn compare_cells(a: &HierarchyNode, b: &HierarchyNode, key: ColumnKey) -> Ordering {
    match key {
        ColumnKey::ChildCount => a.child_count.cmp(&b.child_count),
        other => column_value(a, other).cmp(&column_value(b, other)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hierarchy::{Forest, OrphanPolicy};
    use crate::model::{Entity, EntityId, EntityType, Metadata};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ent(
        id: &str,
        t: EntityType,
        parent: Option<&str>,
        name: &str,
        meta: serde_json::Value,
    ) -> Entity {
        Entity {
            id: EntityId::from(id),
            entity_type: t,
            name: name.into(),
            parent_id: parent.map(EntityId::from),
            metadata: Metadata::from_value(t, Some(meta)),
            created_at: None,
            updated_at: None,
        }
    }

    fn branch_forest() -> Forest {
        Forest::build(
            vec![
                ent("b1", EntityType::Branch, None, "Andheri", json!({})),
                ent(
                    "d1",
                    EntityType::Device,
                    Some("b1"),
                    "ATM-2",
                    json!({"status": "offline", "type": "ATM"}),
                ),
                ent(
                    "d2",
                    EntityType::Device,
                    Some("b1"),
                    "ATM-1",
                    json!({"status": "online", "type": "ATM"}),
                ),
                ent(
                    "d3",
                    EntityType::Device,
                    Some("b1"),
                    "Cam-1",
                    json!({"status": "maintenance", "type": "Security Camera"}),
                ),
            ],
            OrphanPolicy::Promote,
        )
        .unwrap()
    }

    fn names(rows: &[&HierarchyNode]) -> Vec<String> {
        rows.iter().map(|n| n.name().to_owned()).collect()
    }

    #[test]
    fn tri_state_sort_cycle() {
        let forest = branch_forest();
        let mut view = TableView::new(&forest.roots()[0], None);

        assert_eq!(names(&view.rows()), vec!["ATM-1", "ATM-2", "Cam-1"]);

        assert!(view.toggle_sort(ColumnKey::Status));
        assert_eq!(names(&view.rows()), vec!["Cam-1", "ATM-2", "ATM-1"]);

        view.toggle_sort(ColumnKey::Status);
        assert_eq!(view.sort().unwrap().direction, SortDirection::Descending);
        assert_eq!(names(&view.rows()), vec!["ATM-1", "ATM-2", "Cam-1"]);

        view.toggle_sort(ColumnKey::Status);
        assert_eq!(view.sort(), None);
    }

    #[test]
    fn switching_column_restarts_ascending() {
        let forest = branch_forest();
        let mut view = TableView::new(&forest.roots()[0], None);
        view.toggle_sort(ColumnKey::Status);
        view.toggle_sort(ColumnKey::Name);
        assert_eq!(
            view.sort(),
            Some(SortState {
                key: ColumnKey::Name,
                direction: SortDirection::Ascending
            })
        );
    }

    #[test]
    fn unsortable_column_is_ignored() {
        let forest = branch_forest();
        let mut view = TableView::new(&forest.roots()[0], None);
        assert!(!view.toggle_sort(ColumnKey::IpAddress));
        assert!(!view.toggle_sort(ColumnKey::Manager));
        assert_eq!(view.sort(), None);
    }

    #[test]
    fn search_spans_all_columns() {
        let forest = branch_forest();
        let mut view = TableView::new(&forest.roots()[0], None);

        view.set_search("CAMERA");
        assert_eq!(names(&view.rows()), vec!["Cam-1"]);

        view.set_search("offline");
        assert_eq!(names(&view.rows()), vec!["ATM-2"]);
        assert_eq!(view.total(), 3);
    }

    #[test]
    fn cells_follow_columns() {
        let forest = branch_forest();
        let view = TableView::new(&forest.roots()[0], None);
        let cells = view.cells();
        assert_eq!(cells[0], vec!["ATM-1", "ATM", "", "online", ""]);
    }
}
