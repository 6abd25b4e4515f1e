//! Reactive data layer between `bankwatch-api` and the CLI.
//!
//! This crate owns the domain model, the hierarchy logic, and the data
//! infrastructure for the bankwatch workspace:
//!
//! - **[`Controller`]**: central facade managing the full lifecycle.
//!   [`connect()`](Controller::connect) resolves the user's access scope,
//!   fetches the visible entity set, builds the [`Forest`], then spawns
//!   background tasks for periodic refresh, the dashboard summary, and
//!   command processing. [`Controller::oneshot()`](Controller::oneshot)
//!   provides a fire-and-forget mode for single CLI invocations.
//!
//! - **[`DataStore`]**: reactive storage built on `EntityCollection<T>`
//!   (`DashMap` + `tokio::sync::watch` channels) plus an `ArcSwap`'d forest.
//!   Fetch results are fenced by generation so stale cycles never land.
//!
//! - **[`hierarchy`]**: the forest builder, breadcrumb resolution, and the
//!   tier-driven child-type and column derivations.
//!
//! - **[`Command`]**: typed mutation requests routed through an `mpsc`
//!   channel to the controller's command processor. Reads bypass the
//!   channel via direct `DataStore` snapshots.
//!
//! - **[`EntitySource`]**: the seam between the controller and the store,
//!   implemented over REST ([`RestSource`]) and in memory ([`MemorySource`]).

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod source;
pub mod store;
pub mod summary;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{AuthCredentials, ControllerConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use hierarchy::{
    BreadcrumbItem, BuildReport, Column, ColumnKey, Forest, HierarchyNode, MAX_HIERARCHY_DEPTH,
    OrphanPolicy, SortDirection, SortState, TableView, column_value, display_fields,
    next_child_type, table_columns,
};
pub use source::{EntitySource, MemorySource, RestSource};
pub use store::DataStore;
pub use summary::DashboardSummary;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessScope, CustomerMeta, DeviceKind, DeviceMeta, DeviceStatus, Entity, EntityId,
    EntityType, EntityUpdate, HierarchyConfig, Metadata, NewEntity, OrgUnitMeta, Role,
    UserContext,
};
