// ── Reactive data store ──
//
// Holds the resident entity set, hierarchy configs, the built forest,
// and the dashboard summary. Readers get cheap snapshots; the forest is
// swapped as a whole, never edited in place.

mod collection;
mod refresh;

use std::ops::Deref;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tokio::sync::watch;

use collection::EntityCollection;
pub(crate) use refresh::RefreshSnapshot;

use crate::hierarchy::{Forest, next_child_type};
use crate::model::{Entity, EntityId, EntityType, HierarchyConfig};
use crate::summary::DashboardSummary;

pub struct DataStore {
    entities: EntityCollection<Entity>,
    configs: EntityCollection<HierarchyConfig>,
    forest: ArcSwap<Forest>,
    summary: watch::Sender<Option<Arc<DashboardSummary>>>,
    /// Generation of the last applied fetch; held while applying.
    applied_generation: Mutex<u64>,
}

impl DataStore {
    pub fn new() -> Self {
        let (summary, _) = watch::channel(None);

        Self {
            entities: EntityCollection::new(),
            configs: EntityCollection::new(),
            forest: ArcSwap::from_pointee(Forest::empty()),
            summary,
            applied_generation: Mutex::new(0),
        }
    }

    // ── Forest ───────────────────────────────────────────────────────

    /// The current forest (cheap `Arc` clone of the last swap).
    pub fn forest(&self) -> Arc<Forest> {
        self.forest.load_full()
    }

    // ── Entities & configs ───────────────────────────────────────────

    pub fn entity(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.entities.get(id)
    }

    pub fn entities_snapshot(&self) -> Arc<Vec<Arc<Entity>>> {
        self.entities.snapshot()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn hierarchy_config(&self, customer_id: &EntityId) -> Option<Arc<HierarchyConfig>> {
        self.configs.get(customer_id)
    }

    /// The hierarchy config governing an entity (its root customer's).
    pub fn config_for(&self, id: &EntityId) -> Option<Arc<HierarchyConfig>> {
        let forest = self.forest();
        let root = forest.root_of(id)?;
        self.hierarchy_config(root.id())
    }

    /// Child tier of a resident entity, per its customer's config.
    pub fn child_type_of(&self, id: &EntityId) -> Option<EntityType> {
        let entity = self.entities.get(id)?;
        let config = self.config_for(id);
        next_child_type(entity.entity_type, config.as_deref())
    }

    // ── Summary ──────────────────────────────────────────────────────

    pub fn summary(&self) -> Option<Arc<DashboardSummary>> {
        self.summary.borrow().clone()
    }

    pub fn subscribe_summary(&self) -> watch::Receiver<Option<Arc<DashboardSummary>>> {
        self.summary.subscribe()
    }

    /// Recompute the summary from the resident entity set.
    pub(crate) fn refresh_summary(&self) -> Arc<DashboardSummary> {
        let snapshot = self.entities.snapshot();
        let summary = Arc::new(DashboardSummary::compute(snapshot.iter().map(Deref::deref)));
        self.summary.send_replace(Some(Arc::clone(&summary)));
        summary
    }

    /// Publish counts computed elsewhere (the controller's summary timer).
    pub(crate) fn publish_summary(&self, summary: Arc<DashboardSummary>) {
        self.summary.send_replace(Some(summary));
    }

    /// Drop everything (on disconnect or scope change).
    pub(crate) fn clear(&self) {
        self.entities.clear();
        self.configs.clear();
        self.forest.store(Arc::new(Forest::empty()));
        self.summary.send_replace(None);
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
