// ── Breadcrumb / ancestor resolution ──

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::MAX_HIERARCHY_DEPTH;
use super::builder::{Forest, OrphanPolicy};
use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityType};
use crate::source::EntitySource;

/// One step of an ancestor path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreadcrumbItem {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
}

impl From<&Entity> for BreadcrumbItem {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            entity_type: e.entity_type,
        }
    }
}

/// Tracks a parent walk and stops it on revisits or runaway depth.
struct Walk {
    start: EntityId,
    visited: HashSet<EntityId>,
    items: Vec<BreadcrumbItem>,
}

impl Walk {
    fn new(start: &EntityId) -> Self {
        Self {
            start: start.clone(),
            visited: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn step(&mut self, entity: &Entity) -> Result<(), CoreError> {
        if !self.visited.insert(entity.id.clone()) || self.items.len() >= MAX_HIERARCHY_DEPTH {
            return Err(CoreError::HierarchyCycle {
                id: self.start.to_string(),
                max_depth: MAX_HIERARCHY_DEPTH,
            });
        }
        self.items.push(BreadcrumbItem::from(entity));
        Ok(())
    }

    /// Root first, requested node last.
    fn finish(mut self) -> Vec<BreadcrumbItem> {
        self.items.reverse();
        self.items
    }
}

impl Forest {
    /// Ancestor path of a resident entity, root first. No I/O.
    ///
    /// Placed nodes read their path straight off the tree, at any depth.
    /// Entities left out of the tree fall back to a capped parent walk in
    /// which promoted orphans terminate the walk like a root does.
    pub fn resolve_path(&self, id: &EntityId) -> Result<Vec<BreadcrumbItem>, CoreError> {
        if let Some(nodes) = self.ancestry(id) {
            return Ok(nodes
                .into_iter()
                .map(|n| BreadcrumbItem::from(n.entity.as_ref()))
                .collect());
        }

        let mut current = self.entity(id).ok_or_else(|| CoreError::NotFound {
            entity_type: "entity".into(),
            identifier: id.to_string(),
        })?;
        let mut walk = Walk::new(id);

        loop {
            walk.step(current)?;
            if self.is_promoted(&current.id) {
                break;
            }
            let Some(parent_id) = &current.parent_id else {
                break;
            };
            match self.entity(parent_id) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(walk.finish())
    }
}

/// Ancestor path resolved with one point lookup per level.
///
/// Used for entities that are not resident in the current forest. A
/// missing ancestor ends the walk under [`OrphanPolicy::Promote`] and is
/// an error under [`OrphanPolicy::Strict`].
pub async fn resolve_path_remote<S: EntitySource>(
    source: &S,
    id: &EntityId,
    policy: OrphanPolicy,
) -> Result<Vec<BreadcrumbItem>, CoreError> {
    let mut current = source.get_entity(id).await?;
    let mut walk = Walk::new(id);

    loop {
        walk.step(&current)?;
        let Some(parent_id) = current.parent_id.clone() else {
            break;
        };
        debug!(%parent_id, "resolving ancestor");
        match source.get_entity(&parent_id).await {
            Ok(parent) => current = parent,
            Err(CoreError::NotFound { .. }) => match policy {
                OrphanPolicy::Promote => {
                    warn!(id = %current.id, %parent_id, "ancestor missing, path starts at orphan");
                    break;
                }
                OrphanPolicy::Strict => {
                    return Err(CoreError::OrphanedEntity {
                        id: current.id.to_string(),
                        parent_id: parent_id.to_string(),
                    });
                }
            },
            Err(e) => return Err(e),
        }
    }

    Ok(walk.finish())
}
