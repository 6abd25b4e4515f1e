// ── Hierarchy materialization ──
//
// Flat entities in, sorted forest out; plus ancestor paths and the
// tier-driven child-type and column derivations.

mod breadcrumb;
mod builder;
mod columns;
mod derive;
mod table;

/// Longest parent chain any resolver will follow before giving up.
pub const MAX_HIERARCHY_DEPTH: usize = 16;

pub use breadcrumb::{BreadcrumbItem, resolve_path_remote};
pub use builder::{BuildReport, Forest, HierarchyNode, Iter, OrphanPolicy};
pub use columns::{Column, ColumnKey, column_value, table_columns};
pub use derive::{display_fields, next_child_type};
pub use table::{SortDirection, SortState, TableView};
