// ── Reactive entity collection ──
//
// Lock-free concurrent storage with O(1) lookups by id and a cached
// snapshot that readers clone without touching the map.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Entity, EntityId, HierarchyConfig};

/// Anything stored in an [`EntityCollection`] knows its own key.
pub(crate) trait Keyed {
    fn key(&self) -> &EntityId;
}

impl Keyed for Entity {
    fn key(&self) -> &EntityId {
        &self.id
    }
}

impl Keyed for HierarchyConfig {
    fn key(&self) -> &EntityId {
        &self.customer_id
    }
}

/// A lock-free collection keyed by [`EntityId`].
///
/// Every mutation rebuilds the snapshot handed out to readers.
pub(crate) struct EntityCollection<T: Keyed + Clone + Send + Sync + 'static> {
    by_id: DashMap<EntityId, Arc<T>>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Keyed + Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Replace the whole contents: insert everything incoming, then drop
    /// keys that are no longer present. Publishes one snapshot.
    pub(crate) fn replace_all(&self, items: Vec<T>) {
        let incoming: std::collections::HashSet<EntityId> =
            items.iter().map(|i| i.key().clone()).collect();
        for item in items {
            self.by_id.insert(item.key().clone(), Arc::new(item));
        }
        self.by_id.retain(|id, _| incoming.contains(id));
        self.rebuild_snapshot();
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.rebuild_snapshot();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot vec and broadcast it.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EntityType, Metadata};

    fn ent(id: &str, name: &str) -> Entity {
        Entity {
            id: EntityId::from(id),
            entity_type: EntityType::Zone,
            name: name.into(),
            parent_id: Some(EntityId::from("c1")),
            metadata: Metadata::empty(EntityType::Zone),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn replace_all_prunes_missing() {
        let col = EntityCollection::new();
        col.replace_all(vec![ent("z1", "West"), ent("z2", "East")]);
        assert_eq!(col.len(), 2);

        col.replace_all(vec![ent("z2", "East 2"), ent("z3", "North")]);

        assert!(col.get(&EntityId::from("z1")).is_none());
        assert_eq!(col.get(&EntityId::from("z2")).unwrap().name, "East 2");
        assert_eq!(col.snapshot().len(), 2);
    }

    #[test]
    fn clear_empties_snapshot() {
        let col = EntityCollection::new();
        col.replace_all(vec![ent("z1", "West")]);
        col.clear();
        assert!(col.snapshot().is_empty());
        assert_eq!(col.len(), 0);
    }
}
