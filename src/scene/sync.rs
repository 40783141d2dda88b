//! Keeps the scene graph in step with the list of placed entities.
//!
//! [`SceneSynchronizer`] is the only place scene nodes are created, mutated or
//! destroyed. Nodes live in a slot map arena; `nodes_by_entity` maps each
//! entity id to its node key. Outside of a call the two always have the same
//! size, and the preview node is never part of either.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;
use tracing::{debug, trace};

use super::node::{NodeBlueprint, SceneNode};
use crate::entity::{EntityKind, PlacedEntity};
use crate::geometry::{normalize_degrees, rotated_footprint, Dimensions, Point, Point3, Rect, UnitScale};
use crate::plan::{Catalog, PlaceableTemplate};

new_key_type! {
    /// Stable handle of a node in the arena
    pub struct NodeKey;
}

/// Entity id used by the preview node
pub const PREVIEW_ID: &str = "__preview__";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("entity '{0}' already has a scene node")]
    DuplicateEntity(String),

    #[error("entity '{0}' has no scene node")]
    UnknownEntity(String),
}

/// How a whole entity list is pushed into the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Clear every node and insert the list again
    #[default]
    Rebuild,
    /// Diff against the current nodes and touch only what changed
    Reconcile,
}

/// What a reconcile pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub inserted: usize,
    pub removed: usize,
    pub moved: usize,
    pub rebuilt: usize,
}

#[derive(Debug, Default)]
pub struct SceneSynchronizer {
    arena: SlotMap<NodeKey, SceneNode>,
    nodes_by_entity: HashMap<String, NodeKey>,
    preview: Option<SceneNode>,
    units: UnitScale,
}

fn template_for<'c>(entity: &PlacedEntity, catalog: &'c Catalog) -> Option<&'c PlaceableTemplate> {
    entity.template_id.as_deref().and_then(|id| catalog.get(id))
}

fn find_duplicate(entities: &[PlacedEntity]) -> Option<&str> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .map(|e| e.id.as_str())
        .find(|id| !seen.insert(*id))
}

impl SceneSynchronizer {
    pub fn new(units: UnitScale) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn units(&self) -> &UnitScale {
        &self.units
    }

    fn build_node(&self, entity: &PlacedEntity, template: Option<&PlaceableTemplate>) -> SceneNode {
        SceneNode::build(
            entity.id.clone(),
            NodeBlueprint::resolve(entity, template),
            self.units.world_to_scene(entity.position()),
            normalize_degrees(entity.rotation),
        )
    }

    /// Build and register the node for an entity
    pub fn insert(
        &mut self,
        entity: &PlacedEntity,
        template: Option<&PlaceableTemplate>,
    ) -> Result<NodeKey, SceneError> {
        if self.nodes_by_entity.contains_key(&entity.id) {
            return Err(SceneError::DuplicateEntity(entity.id.clone()));
        }
        let node = self.build_node(entity, template);
        let key = self.arena.insert(node);
        self.nodes_by_entity.insert(entity.id.clone(), key);
        trace!(entity = %entity.id, "node inserted");
        Ok(key)
    }

    fn node_mut(&mut self, entity_id: &str) -> Result<&mut SceneNode, SceneError> {
        let key = *self
            .nodes_by_entity
            .get(entity_id)
            .ok_or_else(|| SceneError::UnknownEntity(entity_id.to_string()))?;
        self.arena
            .get_mut(key)
            .ok_or_else(|| SceneError::UnknownEntity(entity_id.to_string()))
    }

    /// Move a node in place. `position` is in world meters.
    pub fn update_position(&mut self, entity_id: &str, position: Point3) -> Result<(), SceneError> {
        let scene_position = self.units.world_to_scene(position);
        self.node_mut(entity_id)?.position = scene_position;
        Ok(())
    }

    /// Rotate a node in place; returns the normalized angle
    pub fn update_rotation(&mut self, entity_id: &str, degrees: f64) -> Result<f64, SceneError> {
        let normalized = normalize_degrees(degrees);
        self.node_mut(entity_id)?.rotation = normalized;
        Ok(normalized)
    }

    /// Rebuild a node with new dimensions under the same entity id
    pub fn update_size(&mut self, entity_id: &str, dimensions: Dimensions) -> Result<NodeKey, SceneError> {
        let key = *self
            .nodes_by_entity
            .get(entity_id)
            .ok_or_else(|| SceneError::UnknownEntity(entity_id.to_string()))?;
        let old = self
            .arena
            .remove(key)
            .ok_or_else(|| SceneError::UnknownEntity(entity_id.to_string()))?;
        self.nodes_by_entity.remove(entity_id);

        let blueprint = NodeBlueprint {
            dimensions,
            ..old.blueprint
        };
        let node = SceneNode::build(entity_id, blueprint, old.position, old.rotation);
        let key = self.arena.insert(node);
        self.nodes_by_entity.insert(entity_id.to_string(), key);
        debug!(entity = %entity_id, "node rebuilt with new size");
        Ok(key)
    }

    /// Detach and drop a node. Returns false when there was nothing to remove.
    pub fn remove(&mut self, entity_id: &str) -> bool {
        match self.nodes_by_entity.remove(entity_id) {
            Some(key) => {
                self.arena.remove(key);
                trace!(entity = %entity_id, "node removed");
                true
            }
            None => false,
        }
    }

    /// Drop every node and insert the given entities.
    ///
    /// Duplicate ids are rejected before anything is cleared.
    pub fn bulk_replace(&mut self, entities: &[PlacedEntity], catalog: &Catalog) -> Result<(), SceneError> {
        if let Some(dup) = find_duplicate(entities) {
            return Err(SceneError::DuplicateEntity(dup.to_string()));
        }

        self.arena.clear();
        self.nodes_by_entity.clear();
        for entity in entities {
            self.insert(entity, template_for(entity, catalog))?;
        }
        debug!(nodes = self.arena.len(), "scene rebuilt");
        Ok(())
    }

    /// Bring the scene to the same state as [`Self::bulk_replace`] by diffing.
    pub fn reconcile(&mut self, entities: &[PlacedEntity], catalog: &Catalog) -> Result<SyncStats, SceneError> {
        if let Some(dup) = find_duplicate(entities) {
            return Err(SceneError::DuplicateEntity(dup.to_string()));
        }

        let mut stats = SyncStats::default();
        let wanted: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();

        let stale: Vec<String> = self
            .nodes_by_entity
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.remove(&id);
            stats.removed += 1;
        }

        for entity in entities {
            let template = template_for(entity, catalog);
            let Some(&key) = self.nodes_by_entity.get(&entity.id) else {
                self.insert(entity, template)?;
                stats.inserted += 1;
                continue;
            };

            let blueprint = NodeBlueprint::resolve(entity, template);
            let position = self.units.world_to_scene(entity.position());
            let rotation = normalize_degrees(entity.rotation);

            let same_geometry = self
                .arena
                .get(key)
                .is_some_and(|node| node.blueprint == blueprint);

            if same_geometry {
                if let Some(node) = self.arena.get_mut(key) {
                    if node.position != position || node.rotation != rotation {
                        node.position = position;
                        node.rotation = rotation;
                        stats.moved += 1;
                    }
                }
            } else {
                self.remove(&entity.id);
                self.insert(entity, template)?;
                stats.rebuilt += 1;
            }
        }

        debug!(?stats, "scene reconciled");
        Ok(stats)
    }

    /// Apply an entity list with the chosen strategy
    pub fn apply(
        &mut self,
        strategy: SyncStrategy,
        entities: &[PlacedEntity],
        catalog: &Catalog,
    ) -> Result<(), SceneError> {
        match strategy {
            SyncStrategy::Rebuild => self.bulk_replace(entities, catalog),
            SyncStrategy::Reconcile => self.reconcile(entities, catalog).map(|_| ()),
        }
    }

    /// Show (or replace) the ghost node used while dragging. `position` is world meters.
    pub fn show_preview(&mut self, template: &PlaceableTemplate, position: Point3, rotation: f64) {
        let entity = PlacedEntity::new(PREVIEW_ID, EntityKind::Furniture, position)
            .with_rotation(rotation);
        let mut node = self.build_node(&entity, Some(template));
        node.ghost = true;
        self.preview = Some(node);
    }

    pub fn move_preview(&mut self, position: Point3) -> bool {
        let scene_position = self.units.world_to_scene(position);
        match self.preview.as_mut() {
            Some(node) => {
                node.position = scene_position;
                true
            }
            None => false,
        }
    }

    /// Drop the ghost node; returns whether one existed
    pub fn clear_preview(&mut self) -> bool {
        self.preview.take().is_some()
    }

    pub fn preview(&self) -> Option<&SceneNode> {
        self.preview.as_ref()
    }

    pub fn node(&self, entity_id: &str) -> Option<&SceneNode> {
        self.nodes_by_entity
            .get(entity_id)
            .and_then(|key| self.arena.get(*key))
    }

    pub fn key(&self, entity_id: &str) -> Option<NodeKey> {
        self.nodes_by_entity.get(entity_id).copied()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.nodes_by_entity.contains_key(entity_id)
    }

    /// Nodes sorted by entity id
    pub fn nodes(&self) -> Vec<&SceneNode> {
        let mut nodes: Vec<&SceneNode> = self.arena.values().collect();
        nodes.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        nodes
    }

    pub fn len(&self) -> usize {
        self.nodes_by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_by_entity.is_empty()
    }

    /// Rotated floor footprint of a node in world meters
    pub fn world_footprint(&self, node: &SceneNode) -> Rect {
        let center = self.units.scene_to_world(node.position);
        let d = node.dimensions();
        rotated_footprint(Point::new(center.x, center.z), d.width, d.depth, node.rotation)
    }

    /// Union of every node footprint, `None` for an empty scene
    pub fn world_bounds(&self) -> Option<Rect> {
        let footprints: Vec<Rect> = self
            .arena
            .values()
            .map(|node| self.world_footprint(node))
            .collect();
        Rect::union_all(&footprints)
    }

    /// Map and arena agree with each other and with the live entity list
    pub fn check_invariants(&self, live: &[PlacedEntity]) -> bool {
        self.nodes_by_entity.len() == self.arena.len()
            && self.arena.len() == live.len()
            && live.iter().all(|e| self.nodes_by_entity.contains_key(&e.id))
            && self.nodes_by_entity.iter().all(|(id, key)| {
                self.arena
                    .get(*key)
                    .is_some_and(|node| &node.entity_id == id && !node.ghost)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entity(id: &str, x: f64) -> PlacedEntity {
        PlacedEntity::new(id, EntityKind::Furniture, Point3::new(x, 0.0, 0.0))
            .with_dimensions(Dimensions::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_insert_and_duplicate() {
        let mut scene = SceneSynchronizer::default();
        scene.insert(&entity("P001", 0.0), None).unwrap();
        assert_eq!(
            scene.insert(&entity("P001", 1.0), None),
            Err(SceneError::DuplicateEntity("P001".into()))
        );
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_parity_after_inserts_and_removes() {
        let mut scene = SceneSynchronizer::default();
        let mut live: Vec<PlacedEntity> = (1..=10).map(|i| entity(&format!("P{i:03}"), i as f64)).collect();
        for e in &live {
            scene.insert(e, None).unwrap();
        }
        for id in ["P002", "P005", "P009"] {
            assert!(scene.remove(id));
            live.retain(|e| e.id != id);
        }
        // Removing twice is a no-op
        assert!(!scene.remove("P002"));
        assert_eq!(scene.len(), 7);
        assert!(scene.check_invariants(&live));
    }

    #[test]
    fn test_update_rotation_normalizes() {
        let mut scene = SceneSynchronizer::default();
        scene.insert(&entity("P001", 0.0), None).unwrap();
        assert_eq!(scene.update_rotation("P001", 370.0).unwrap(), 10.0);
        assert_eq!(scene.update_rotation("P001", -30.0).unwrap(), 330.0);
        assert_eq!(scene.node("P001").unwrap().rotation, 330.0);
    }

    #[test]
    fn test_update_unknown_entity() {
        let mut scene = SceneSynchronizer::default();
        assert_eq!(
            scene.update_position("nope", Point3::zero()),
            Err(SceneError::UnknownEntity("nope".into()))
        );
    }

    #[test]
    fn test_update_position_uses_scene_units() {
        let mut scene = SceneSynchronizer::new(UnitScale::new(100.0, 10.0));
        scene.insert(&entity("P001", 0.0), None).unwrap();
        scene
            .update_position("P001", Point3::new(1.0, 0.0, -2.0))
            .unwrap();
        assert_eq!(scene.node("P001").unwrap().position, Point3::new(10.0, 0.0, -20.0));
    }

    #[test]
    fn test_update_size_keeps_transform() {
        let mut scene = SceneSynchronizer::default();
        scene.insert(&entity("P001", 3.0), None).unwrap();
        scene.update_rotation("P001", 90.0).unwrap();
        scene
            .update_size("P001", Dimensions::new(2.0, 1.0, 0.5))
            .unwrap();
        let node = scene.node("P001").unwrap();
        assert_eq!(node.dimensions(), Dimensions::new(2.0, 1.0, 0.5));
        assert_eq!(node.rotation, 90.0);
        assert_eq!(node.position.x, 3.0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_bulk_replace_rejects_duplicates_untouched() {
        let catalog = Catalog::new();
        let mut scene = SceneSynchronizer::default();
        scene.bulk_replace(&[entity("A", 0.0)], &catalog).unwrap();

        let err = scene
            .bulk_replace(&[entity("B", 0.0), entity("B", 1.0)], &catalog)
            .unwrap_err();
        assert_eq!(err, SceneError::DuplicateEntity("B".into()));
        assert!(scene.contains("A"));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_reconcile_matches_rebuild() {
        let catalog = Catalog::new();
        let before = vec![entity("A", 0.0), entity("B", 1.0), entity("C", 2.0)];
        let after = vec![
            entity("B", 5.0).with_rotation(45.0),
            entity("C", 2.0).with_dimensions(Dimensions::new(3.0, 1.0, 1.0)),
            entity("D", 7.0),
        ];

        let mut rebuilt = SceneSynchronizer::default();
        rebuilt.bulk_replace(&before, &catalog).unwrap();
        rebuilt.bulk_replace(&after, &catalog).unwrap();

        let mut reconciled = SceneSynchronizer::default();
        reconciled.bulk_replace(&before, &catalog).unwrap();
        let stats = reconciled.reconcile(&after, &catalog).unwrap();

        assert_eq!(
            stats,
            SyncStats {
                inserted: 1,
                removed: 1,
                moved: 1,
                rebuilt: 1
            }
        );
        assert_eq!(rebuilt.nodes(), reconciled.nodes());
        assert!(reconciled.check_invariants(&after));
    }

    #[test]
    fn test_preview_is_not_an_entity() {
        let mut scene = SceneSynchronizer::default();
        let live = vec![entity("A", 0.0)];
        scene.insert(&live[0], None).unwrap();

        scene.show_preview(&PlaceableTemplate::fixed_cashier(), Point3::new(1.0, 0.0, 1.0), 0.0);
        assert!(scene.move_preview(Point3::new(2.0, 0.0, 2.0)));
        assert!(scene.preview().is_some_and(|p| p.ghost));
        assert_eq!(scene.len(), 1);
        assert!(scene.check_invariants(&live));

        assert!(scene.clear_preview());
        assert!(!scene.clear_preview());
        assert!(!scene.move_preview(Point3::zero()));
        assert!(scene.check_invariants(&live));
    }

    #[test]
    fn test_world_bounds() {
        let mut scene = SceneSynchronizer::default();
        assert_eq!(scene.world_bounds(), None);
        scene.insert(&entity("A", -2.0), None).unwrap();
        scene.insert(&entity("B", 2.0), None).unwrap();
        assert_eq!(scene.world_bounds(), Some(Rect::new(-2.5, -0.5, 5.0, 1.0)));
    }
}
