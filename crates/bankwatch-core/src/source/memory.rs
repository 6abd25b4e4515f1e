// ── In-memory entity source ──
//
// Interprets `EntityQuery` over a local entity set. Serves fixture files
// and tests; writes behave like the store's (ids assigned on insert,
// foreign keys enforced on delete).

use std::collections::HashMap;
use std::sync::Arc;

use bankwatch_api::{EntityQuery, ParentFilter};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::EntitySource;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityUpdate, HierarchyConfig, NewEntity, UserContext};

#[derive(Default)]
struct MemoryState {
    entities: Vec<Entity>,
    configs: Vec<HierarchyConfig>,
    profiles: HashMap<String, UserContext>,
    offline: bool,
}

/// A local, mutable stand-in for the entity store.
#[derive(Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySource {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                entities,
                ..MemoryState::default()
            })),
        }
    }

    #[must_use]
    pub fn with_configs(self, configs: Vec<HierarchyConfig>) -> Self {
        if let Ok(mut state) = self.state.try_lock() {
            state.configs = configs;
        }
        self
    }

    #[must_use]
    pub fn with_profile(self, profile: UserContext) -> Self {
        if let Ok(mut state) = self.state.try_lock() {
            state.profiles.insert(profile.user_id.clone(), profile);
        }
        self
    }

    /// Make every call fail as if the store were unreachable.
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// Current contents, in insertion order.
    pub async fn entities(&self) -> Vec<Entity> {
        self.state.lock().await.entities.clone()
    }

    /// Append an entity behind the controller's back.
    pub async fn push(&self, entity: Entity) {
        self.state.lock().await.entities.push(entity);
    }
}

fn check_online(state: &MemoryState) -> Result<(), CoreError> {
    if state.offline {
        return Err(CoreError::ConnectionFailed {
            url: "memory://".into(),
            reason: "source offline".into(),
        });
    }
    Ok(())
}

fn not_found(id: &EntityId) -> CoreError {
    CoreError::NotFound {
        entity_type: "entity".into(),
        identifier: id.to_string(),
    }
}

fn matches_query(entity: &Entity, query: &EntityQuery) -> bool {
    if let Some(t) = &query.entity_type {
        if entity.entity_type.as_ref() != t.as_str() {
            return false;
        }
    }

    let parent = entity.parent_id.as_ref().map(ToString::to_string);
    let parent_ok = match &query.parent {
        ParentFilter::Any => true,
        ParentFilter::Root => parent.is_none(),
        ParentFilter::Eq(p) => parent.as_deref() == Some(p.as_str()),
        ParentFilter::In(ps) => parent.is_some_and(|p| ps.contains(&p)),
    };
    if !parent_ok {
        return false;
    }

    match &query.ids {
        Some(ids) => ids.contains(&entity.id.to_string()),
        None => true,
    }
}

impl EntitySource for MemorySource {
    async fn list_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>, CoreError> {
        let state = self.state.lock().await;
        check_online(&state)?;

        let mut rows: Vec<Entity> = state
            .entities
            .iter()
            .filter(|e| matches_query(e, query))
            .cloned()
            .collect();
        if query.order_by_name {
            rows.sort_by(|a, b| a.name.cmp(&b.name));
        }
        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }

    async fn get_entity(&self, id: &EntityId) -> Result<Entity, CoreError> {
        let state = self.state.lock().await;
        check_online(&state)?;
        state
            .entities
            .iter()
            .rev()
            .find(|e| &e.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn list_hierarchy_configs(
        &self,
        customer_ids: Option<&[EntityId]>,
    ) -> Result<Vec<HierarchyConfig>, CoreError> {
        let state = self.state.lock().await;
        check_online(&state)?;
        Ok(state
            .configs
            .iter()
            .filter(|c| customer_ids.is_none_or(|ids| ids.contains(&c.customer_id)))
            .cloned()
            .collect())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserContext>, CoreError> {
        let state = self.state.lock().await;
        check_online(&state)?;
        Ok(state.profiles.get(user_id).cloned())
    }

    async fn insert_entity(&self, entity: &NewEntity) -> Result<Entity, CoreError> {
        let mut state = self.state.lock().await;
        check_online(&state)?;
        if let Some(parent) = &entity.parent_id {
            if !state.entities.iter().any(|e| &e.id == parent) {
                return Err(CoreError::Conflict {
                    message: format!("parent {parent} does not exist"),
                });
            }
        }

        let now = Utc::now();
        let stored = Entity {
            id: EntityId::Uuid(Uuid::new_v4()),
            entity_type: entity.entity_type,
            name: entity.name.clone(),
            parent_id: entity.parent_id.clone(),
            metadata: entity.metadata.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.entities.push(stored.clone());
        Ok(stored)
    }

    async fn update_entity(
        &self,
        id: &EntityId,
        update: &EntityUpdate,
    ) -> Result<Entity, CoreError> {
        let mut state = self.state.lock().await;
        check_online(&state)?;
        let entity = state
            .entities
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| not_found(id))?;

        if let Some(name) = &update.name {
            entity.name.clone_from(name);
        }
        if let Some(metadata) = &update.metadata {
            entity.metadata = metadata.clone();
        }
        entity.updated_at = Some(Utc::now());
        Ok(entity.clone())
    }

    async fn delete_entity(&self, id: &EntityId) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        check_online(&state)?;
        if state.entities.iter().any(|e| e.parent_id.as_ref() == Some(id)) {
            return Err(CoreError::Conflict {
                message: format!("entity {id} is still referenced by its children"),
            });
        }
        let before = state.entities.len();
        state.entities.retain(|e| &e.id != id);
        if state.entities.len() == before {
            return Err(not_found(id));
        }
        state.configs.retain(|c| &c.customer_id != id);
        Ok(())
    }

    async fn insert_hierarchy_config(
        &self,
        config: &HierarchyConfig,
    ) -> Result<HierarchyConfig, CoreError> {
        let mut state = self.state.lock().await;
        check_online(&state)?;
        if state.configs.iter().any(|c| c.customer_id == config.customer_id) {
            return Err(CoreError::Conflict {
                message: format!("customer {} already has a hierarchy config", config.customer_id),
            });
        }
        state.configs.push(config.clone());
        Ok(config.clone())
    }
}
