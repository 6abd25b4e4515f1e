// ── Fetch-cycle application ──
//
// Applies one fetch cycle's results to the DataStore, fenced by
// generation so a slow, older fetch can never overwrite a newer view.

use std::sync::{Arc, PoisonError};

use tracing::debug;

use super::DataStore;
use crate::hierarchy::Forest;
use crate::model::{Entity, HierarchyConfig};

/// Everything produced by a single fetch cycle.
pub(crate) struct RefreshSnapshot {
    pub generation: u64,
    pub entities: Vec<Entity>,
    pub configs: Vec<HierarchyConfig>,
    pub forest: Forest,
}

impl DataStore {
    /// Apply a fetch cycle. Returns `false` (and changes nothing) when a
    /// newer generation has already been applied.
    pub(crate) fn apply_snapshot(&self, snap: RefreshSnapshot) -> bool {
        let mut applied = self
            .applied_generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if snap.generation <= *applied {
            debug!(
                generation = snap.generation,
                applied = *applied,
                "discarding stale fetch result"
            );
            return false;
        }
        *applied = snap.generation;

        self.entities.replace_all(snap.entities);
        self.configs.replace_all(snap.configs);
        self.forest.store(Arc::new(snap.forest));
        true
    }

    /// Generation of the most recently applied fetch (0 before the first).
    pub fn applied_generation(&self) -> u64 {
        *self
            .applied_generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hierarchy::OrphanPolicy;
    use crate::model::{EntityId, EntityType, Metadata};

    fn customer(id: &str, name: &str) -> Entity {
        Entity {
            id: EntityId::from(id),
            entity_type: EntityType::Customer,
            name: name.into(),
            parent_id: None,
            metadata: Metadata::empty(EntityType::Customer),
            created_at: None,
            updated_at: None,
        }
    }

    fn snapshot(generation: u64, entities: Vec<Entity>) -> RefreshSnapshot {
        RefreshSnapshot {
            generation,
            forest: Forest::build(entities.clone(), OrphanPolicy::Promote).unwrap(),
            entities,
            configs: Vec::new(),
        }
    }

    #[test]
    fn newer_generation_applies() {
        let store = DataStore::new();
        assert!(store.apply_snapshot(snapshot(1, vec![customer("c1", "Acme")])));
        assert!(store.apply_snapshot(snapshot(2, vec![customer("c2", "Zenith")])));

        assert_eq!(store.entity_count(), 1);
        assert_eq!(store.forest().roots()[0].name(), "Zenith");
        assert_eq!(store.applied_generation(), 2);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let store = DataStore::new();
        // Fetch 2 finishes before fetch 1.
        assert!(store.apply_snapshot(snapshot(2, vec![customer("c2", "Fresh")])));
        assert!(!store.apply_snapshot(snapshot(1, vec![customer("c1", "Stale")])));

        assert_eq!(store.forest().roots()[0].name(), "Fresh");
        assert!(store.entity(&EntityId::from("c1")).is_none());
    }

    #[test]
    fn clear_resets_forest_but_keeps_generation() {
        let store = DataStore::new();
        store.apply_snapshot(snapshot(1, vec![customer("c1", "Acme")]));
        store.clear();

        assert!(store.forest().is_empty());
        assert_eq!(store.entity_count(), 0);
        assert!(!store.apply_snapshot(snapshot(1, vec![customer("c1", "Acme")])));
    }

    #[test]
    fn summary_follows_entities() {
        let store = DataStore::new();
        store.apply_snapshot(snapshot(1, vec![customer("c1", "Acme")]));
        let summary = store.refresh_summary();
        assert_eq!(summary.total_customers, 1);
        assert_eq!(store.summary().unwrap().total_customers, 1);
    }
}
