// ── Entity source abstraction ──
//
// The controller talks to the store through this trait so the same
// fetch/command logic runs against the REST backend and against an
// in-memory set (fixtures, tests).

mod memory;
mod rest;

use std::future::Future;

use bankwatch_api::EntityQuery;

use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityUpdate, HierarchyConfig, NewEntity, UserContext};

pub use memory::MemorySource;
pub use rest::RestSource;

/// Read and write access to the entity store.
pub trait EntitySource: Send + Sync + 'static {
    /// Rows matching the query, ordered by name when the query asks for it.
    fn list_entities(
        &self,
        query: &EntityQuery,
    ) -> impl Future<Output = Result<Vec<Entity>, CoreError>> + Send;

    /// Point lookup. [`CoreError::NotFound`] when absent.
    fn get_entity(&self, id: &EntityId) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    /// Hierarchy configs, all or for the given customers only.
    fn list_hierarchy_configs(
        &self,
        customer_ids: Option<&[EntityId]>,
    ) -> impl Future<Output = Result<Vec<HierarchyConfig>, CoreError>> + Send;

    fn get_profile(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<UserContext>, CoreError>> + Send;

    fn insert_entity(
        &self,
        entity: &NewEntity,
    ) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    fn update_entity(
        &self,
        id: &EntityId,
        update: &EntityUpdate,
    ) -> impl Future<Output = Result<Entity, CoreError>> + Send;

    fn delete_entity(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn insert_hierarchy_config(
        &self,
        config: &HierarchyConfig,
    ) -> impl Future<Output = Result<HierarchyConfig, CoreError>> + Send;
}
