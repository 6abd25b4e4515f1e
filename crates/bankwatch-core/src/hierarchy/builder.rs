// ── Hierarchy builder ──
//
// Turns the flat adjacency list fetched from the store into a sorted,
// levelled forest. The forest is immutable once built; every fetch cycle
// produces a new one.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Entity, EntityId, EntityType};

/// What to do with an entity whose parent is not in the fetched set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OrphanPolicy {
    /// Show it as an extra root and record it in the build report.
    #[default]
    Promote,
    /// Fail the build with [`CoreError::OrphanedEntity`].
    Strict,
}

/// An entity placed in the forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub entity: Arc<Entity>,
    pub children: Vec<HierarchyNode>,
    pub child_count: usize,
    /// Distance from the node's root (roots are 0).
    pub level: usize,
}

impl HierarchyNode {
    pub fn id(&self) -> &EntityId {
        &self.entity.id
    }

    pub fn name(&self) -> &str {
        &self.entity.name
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity.entity_type
    }

    /// Depth-first, pre-order walk of this subtree (self first).
    pub fn walk(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// This subtree restricted to case-insensitive name matches and
    /// their ancestors. `None` when nothing matches; a blank term keeps
    /// everything.
    pub fn filter(&self, term: &str) -> Option<HierarchyNode> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Some(self.clone());
        }
        filter_node(self, &needle)
    }
}

fn filter_node(node: &HierarchyNode, needle: &str) -> Option<HierarchyNode> {
    let children: Vec<HierarchyNode> = node
        .children
        .iter()
        .filter_map(|child| filter_node(child, needle))
        .collect();

    if children.is_empty() && !node.name().to_lowercase().contains(needle) {
        return None;
    }
    Some(HierarchyNode {
        entity: Arc::clone(&node.entity),
        children,
        child_count: node.child_count,
        level: node.level,
    })
}

/// Anomalies found while building. Empty for well-formed data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Entities whose parent was missing and that were promoted to roots.
    pub orphans: Vec<EntityId>,
    /// Entities not reachable from any root (members of a parent cycle).
    pub unreachable: Vec<EntityId>,
    /// Ids that appeared more than once in the input.
    pub duplicates: Vec<EntityId>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.unreachable.is_empty() && self.duplicates.is_empty()
    }
}

/// A built hierarchy: sorted roots plus O(1) indexes into them.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    roots: Vec<HierarchyNode>,
    lookup: HashMap<EntityId, Arc<Entity>>,
    /// Child-index path from the root list to each placed node.
    paths: HashMap<EntityId, Vec<usize>>,
    promoted: HashSet<EntityId>,
    report: BuildReport,
}

// ── Build ───────────────────────────────────────────────────────────

impl Forest {
    /// Build the forest from an unordered entity set.
    ///
    /// Duplicate ids: last one wins. Entities whose parent is absent are
    /// handled per `policy`. Members of parent cycles are left out of the
    /// forest and listed in [`BuildReport::unreachable`].
    pub fn build(entities: Vec<Entity>, policy: OrphanPolicy) -> Result<Self, CoreError> {
        let mut report = BuildReport::default();

        // 1. Lookup by id.
        let mut lookup: HashMap<EntityId, Arc<Entity>> = HashMap::with_capacity(entities.len());
        for entity in entities {
            let id = entity.id.clone();
            if lookup.insert(id.clone(), Arc::new(entity)).is_some() {
                debug!(%id, "duplicate entity id in input, keeping the last copy");
                report.duplicates.push(id);
            }
        }

        // 2. Link children to parents.
        let mut children_of: HashMap<EntityId, Vec<Arc<Entity>>> = HashMap::new();
        let mut roots: Vec<Arc<Entity>> = Vec::new();
        let mut promoted = HashSet::new();

        for entity in lookup.values() {
            match &entity.parent_id {
                None => roots.push(Arc::clone(entity)),
                Some(parent) if lookup.contains_key(parent) => {
                    children_of
                        .entry(parent.clone())
                        .or_default()
                        .push(Arc::clone(entity));
                }
                Some(_) => {
                    promoted.insert(entity.id.clone());
                    roots.push(Arc::clone(entity));
                }
            }
        }

        let mut orphans: Vec<EntityId> = promoted.iter().cloned().collect();
        orphans.sort();
        if let Some(first) = orphans.first() {
            if policy == OrphanPolicy::Strict {
                let parent_id = lookup
                    .get(first)
                    .and_then(|e| e.parent_id.as_ref())
                    .map(ToString::to_string)
                    .unwrap_or_default();
                return Err(CoreError::OrphanedEntity {
                    id: first.to_string(),
                    parent_id,
                });
            }
            warn!(
                count = orphans.len(),
                ids = ?orphans,
                "entities reference missing parents, promoted to roots"
            );
        }
        report.orphans = orphans;

        // 3. Sort and attach recursively; levels flow top-down.
        sort_siblings(&mut roots);
        let roots: Vec<HierarchyNode> = roots
            .into_iter()
            .map(|entity| attach(entity, 0, &mut children_of))
            .collect();

        // 4. Index paths; whatever was never reached sits on a cycle.
        let mut paths = HashMap::with_capacity(lookup.len());
        let mut path = Vec::new();
        for (i, root) in roots.iter().enumerate() {
            path.push(i);
            index_paths(root, &mut path, &mut paths);
            path.pop();
        }

        let mut unreachable: Vec<EntityId> = lookup
            .keys()
            .filter(|id| !paths.contains_key(*id))
            .cloned()
            .collect();
        unreachable.sort();
        if !unreachable.is_empty() {
            warn!(
                count = unreachable.len(),
                ids = ?unreachable,
                "entities unreachable from any root (parent cycle), left out of the forest"
            );
        }
        report.unreachable = unreachable;

        Ok(Self {
            roots,
            lookup,
            paths,
            promoted,
            report,
        })
    }
}

fn sort_siblings(siblings: &mut [Arc<Entity>]) {
    siblings.sort_by(|a, b| compare_by_name(a, b));
}

/// Byte-wise, case-sensitive by name; ties broken by id.
fn compare_by_name(a: &Entity, b: &Entity) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

fn attach(
    entity: Arc<Entity>,
    level: usize,
    children_of: &mut HashMap<EntityId, Vec<Arc<Entity>>>,
) -> HierarchyNode {
    let mut kids = children_of.remove(&entity.id).unwrap_or_default();
    sort_siblings(&mut kids);
    let children: Vec<HierarchyNode> = kids
        .into_iter()
        .map(|child| attach(child, level + 1, children_of))
        .collect();

    HierarchyNode {
        entity,
        child_count: children.len(),
        children,
        level,
    }
}

fn index_paths(
    node: &HierarchyNode,
    path: &mut Vec<usize>,
    paths: &mut HashMap<EntityId, Vec<usize>>,
) {
    paths.insert(node.id().clone(), path.clone());
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        index_paths(child, path, paths);
        path.pop();
    }
}

// ── Queries ─────────────────────────────────────────────────────────

impl Forest {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[HierarchyNode] {
        &self.roots
    }

    /// Root customers (promoted orphans excluded).
    pub fn customers(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.roots
            .iter()
            .filter(|n| n.entity_type() == EntityType::Customer && !self.promoted.contains(n.id()))
    }

    /// The placed node for an id, in O(depth).
    pub fn find(&self, id: &EntityId) -> Option<&HierarchyNode> {
        let path = self.paths.get(id)?;
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for i in rest {
            node = node.children.get(*i)?;
        }
        Some(node)
    }

    /// Placed nodes from the root down to `id`, inclusive.
    pub fn ancestry(&self, id: &EntityId) -> Option<Vec<&HierarchyNode>> {
        let path = self.paths.get(id)?;
        let mut nodes = Vec::with_capacity(path.len());
        let mut siblings = self.roots.as_slice();
        for i in path {
            let node = siblings.get(*i)?;
            nodes.push(node);
            siblings = &node.children;
        }
        Some(nodes)
    }

    /// Raw entity lookup, including unreachable ones.
    pub fn entity(&self, id: &EntityId) -> Option<&Arc<Entity>> {
        self.lookup.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.paths.contains_key(id)
    }

    pub fn level(&self, id: &EntityId) -> Option<usize> {
        self.paths.get(id).map(|p| p.len().saturating_sub(1))
    }

    pub fn is_promoted(&self, id: &EntityId) -> bool {
        self.promoted.contains(id)
    }

    /// Root of the tree an entity sits in.
    pub fn root_of(&self, id: &EntityId) -> Option<&HierarchyNode> {
        let first = self.paths.get(id)?.first()?;
        self.roots.get(*first)
    }

    /// Number of placed nodes.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Depth-first, pre-order walk over every placed node.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Case-insensitive name search.
    ///
    /// Keeps a node when its name matches or any descendant's does.
    /// Kept nodes report their unfiltered `child_count`. A blank term
    /// returns the whole forest.
    pub fn filter(&self, term: &str) -> Vec<HierarchyNode> {
        self.roots.iter().filter_map(|root| root.filter(term)).collect()
    }
}

/// Pre-order iterator over hierarchy nodes.
pub struct Iter<'a> {
    stack: Vec<&'a HierarchyNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a HierarchyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a HierarchyNode;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use pretty_assertions::assert_eq;

    fn ent(id: &str, entity_type: EntityType, parent: Option<&str>, name: &str) -> Entity {
        Entity {
            id: EntityId::from(id),
            entity_type,
            name: name.into(),
            parent_id: parent.map(EntityId::from),
            metadata: Metadata::empty(entity_type),
            created_at: None,
            updated_at: None,
        }
    }

    fn names(nodes: &[HierarchyNode]) -> Vec<&str> {
        nodes.iter().map(HierarchyNode::name).collect()
    }

    fn bank() -> Vec<Entity> {
        vec![
            ent("d2", EntityType::Device, Some("b1"), "POS-2"),
            ent("b1", EntityType::Branch, Some("z1"), "Andheri"),
            ent("c1", EntityType::Customer, None, "Acme"),
            ent("z1", EntityType::Zone, Some("c1"), "West"),
            ent("z2", EntityType::Zone, Some("c1"), "East"),
            ent("d1", EntityType::Device, Some("b1"), "ATM-1"),
            ent("c2", EntityType::Customer, None, "Zenith"),
        ]
    }

    #[test]
    fn acme_scenario_sorts_children() {
        let forest = Forest::build(
            vec![
                ent("c1", EntityType::Customer, None, "Acme"),
                ent("z1", EntityType::Zone, Some("c1"), "West"),
                ent("z2", EntityType::Zone, Some("c1"), "East"),
            ],
            OrphanPolicy::Promote,
        )
        .unwrap();

        assert_eq!(names(forest.roots()), vec!["Acme"]);
        let acme = &forest.roots()[0];
        assert_eq!(acme.level, 0);
        assert_eq!(names(&acme.children), vec!["East", "West"]);
        for zone in &acme.children {
            assert_eq!(zone.level, 1);
            assert_eq!(zone.child_count, 0);
        }
    }

    #[test]
    fn structural_invariants_hold() {
        let input = bank();
        let count = input.len();
        let forest = Forest::build(input, OrphanPolicy::Promote).unwrap();

        assert_eq!(forest.len(), count);
        assert!(forest.report().is_clean());

        for node in &forest {
            assert_eq!(node.child_count, node.children.len());
            for child in &node.children {
                assert_eq!(child.level, node.level + 1);
            }
            let sorted = node.children.windows(2).all(|w| w[0].name() <= w[1].name());
            assert!(sorted, "children of {} not sorted", node.name());
        }
        for root in forest.roots() {
            assert_eq!(root.level, 0);
        }
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut reversed = bank();
        reversed.reverse();
        let a = Forest::build(bank(), OrphanPolicy::Promote).unwrap();
        let b = Forest::build(reversed, OrphanPolicy::Promote).unwrap();
        assert_eq!(a.roots(), b.roots());
    }

    #[test]
    fn empty_input_is_empty_forest() {
        let forest = Forest::build(Vec::new(), OrphanPolicy::Strict).unwrap();
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
    }

    #[test]
    fn dangling_parent_promoted_to_root() {
        let forest = Forest::build(
            vec![
                ent("c1", EntityType::Customer, None, "Acme"),
                ent("b9", EntityType::Branch, Some("gone"), "Lost Branch"),
            ],
            OrphanPolicy::Promote,
        )
        .unwrap();

        assert_eq!(names(forest.roots()), vec!["Acme", "Lost Branch"]);
        assert_eq!(forest.report().orphans, vec![EntityId::from("b9")]);
        assert!(forest.is_promoted(&EntityId::from("b9")));
        assert_eq!(forest.customers().count(), 1);
    }

    #[test]
    fn strict_policy_rejects_orphans() {
        let err = Forest::build(
            vec![ent("b9", EntityType::Branch, Some("gone"), "Lost Branch")],
            OrphanPolicy::Strict,
        )
        .unwrap_err();

        match err {
            CoreError::OrphanedEntity { id, parent_id } => {
                assert_eq!(id, "b9");
                assert_eq!(parent_id, "gone");
            }
            other => panic!("expected OrphanedEntity, got {other:?}"),
        }
    }

    #[test]
    fn cycle_members_reported_not_placed() {
        let forest = Forest::build(
            vec![
                ent("c1", EntityType::Customer, None, "Acme"),
                ent("a", EntityType::Zone, Some("b"), "A"),
                ent("b", EntityType::Zone, Some("a"), "B"),
                ent("s", EntityType::Zone, Some("s"), "Self"),
            ],
            OrphanPolicy::Promote,
        )
        .unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(
            forest.report().unreachable,
            vec![EntityId::from("a"), EntityId::from("b"), EntityId::from("s")]
        );
        assert!(forest.entity(&EntityId::from("a")).is_some());
        assert!(forest.find(&EntityId::from("a")).is_none());
    }

    #[test]
    fn duplicate_ids_last_wins() {
        let forest = Forest::build(
            vec![
                ent("c1", EntityType::Customer, None, "Old Name"),
                ent("c1", EntityType::Customer, None, "New Name"),
            ],
            OrphanPolicy::Promote,
        )
        .unwrap();
        assert_eq!(names(forest.roots()), vec!["New Name"]);
        assert_eq!(forest.report().duplicates, vec![EntityId::from("c1")]);
    }

    #[test]
    fn sorting_is_case_sensitive_with_id_tiebreak() {
        let forest = Forest::build(
            vec![
                ent("c1", EntityType::Customer, None, "Acme"),
                ent("z3", EntityType::Zone, Some("c1"), "north"),
                ent("z2", EntityType::Zone, Some("c1"), "North"),
                ent("z1", EntityType::Zone, Some("c1"), "North"),
            ],
            OrphanPolicy::Promote,
        )
        .unwrap();
        let ids: Vec<String> = forest.roots()[0]
            .children
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        assert_eq!(ids, vec!["z1", "z2", "z3"]);
    }

    #[test]
    fn find_and_level() {
        let forest = Forest::build(bank(), OrphanPolicy::Promote).unwrap();
        let atm = forest.find(&EntityId::from("d1")).unwrap();
        assert_eq!(atm.name(), "ATM-1");
        assert_eq!(atm.level, 3);
        assert_eq!(forest.level(&EntityId::from("d1")), Some(3));
        assert_eq!(forest.root_of(&EntityId::from("d1")).unwrap().name(), "Acme");
        assert!(forest.find(&EntityId::from("nope")).is_none());
    }

    #[test]
    fn iteration_is_preorder() {
        let forest = Forest::build(bank(), OrphanPolicy::Promote).unwrap();
        let order: Vec<&str> = forest.iter().map(HierarchyNode::name).collect();
        assert_eq!(
            order,
            vec!["Acme", "East", "West", "Andheri", "ATM-1", "POS-2", "Zenith"]
        );
    }

    #[test]
    fn filter_keeps_ancestors_of_matches() {
        let forest = Forest::build(bank(), OrphanPolicy::Promote).unwrap();
        let filtered = forest.filter("atm");

        assert_eq!(names(&filtered), vec!["Acme"]);
        let acme = &filtered[0];
        assert_eq!(names(&acme.children), vec!["West"]);
        assert_eq!(acme.child_count, 2, "child_count stays unfiltered");
        let branch = &acme.children[0].children[0];
        assert_eq!(names(&branch.children), vec!["ATM-1"]);
    }

    #[test]
    fn blank_filter_returns_everything() {
        let forest = Forest::build(bank(), OrphanPolicy::Promote).unwrap();
        assert_eq!(forest.filter("  "), forest.roots().to_vec());
        assert!(forest.filter("no such thing").is_empty());
    }
}
