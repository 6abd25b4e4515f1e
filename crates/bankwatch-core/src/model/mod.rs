// ── Domain model ──

pub mod access;
pub mod entity;
pub mod entity_id;
pub mod hierarchy_config;
pub mod metadata;

pub use access::{AccessScope, Role, UserContext};
pub use entity::{Entity, EntityType, EntityUpdate, NewEntity};
pub use entity_id::EntityId;
pub use hierarchy_config::HierarchyConfig;
pub use metadata::{CustomerMeta, DeviceKind, DeviceMeta, DeviceStatus, Metadata, OrgUnitMeta};
