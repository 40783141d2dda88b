//! The layout session: the single command surface over zones, the active
//! plan, the matcher, the entity list and the scene.
//!
//! Every input event (zone edit, assignment request, drop, drag preview,
//! plan import) goes through a [`Session`] method. The session validates the
//! request, updates its entity list and forwards the change to the
//! [`SceneSynchronizer`], which is never mutated from anywhere else.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::entity::{EntityKind, PlacedEntity};
use crate::geometry::{
    pointer_to_world, world_to_container, ConflictReason, Container, Dimensions, PlanAnchor,
    Point, Point3, Rect, Viewport,
};
use crate::ids::next_id;
use crate::matcher::{Assignment, MatchError, Matcher, Unassign};
use crate::plan::{Catalog, FloorPlan, PlaceableTemplate, PlanElement, PlanError};
use crate::scene::{Camera, Framing, PanDirection, SceneError, SceneSynchronizer};
use crate::zone::{join_reasons, Orientation, Zone, ZoneError, ZoneIds, ZoneLayout};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no floor plan is loaded")]
    NoActivePlan,

    #[error("zone rejected: {}", join_reasons(.0))]
    ZoneRejected(Vec<ConflictReason>),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("template '{0}' is not associated with a plan element")]
    NotAssigned(String),

    #[error("template '{template_id}' is already placed as '{entity_id}'")]
    AlreadyPlaced {
        template_id: String,
        entity_id: String,
    },

    #[error("waiting for a plan element to be chosen for template '{template_id}'")]
    AwaitingDisambiguation { template_id: String },

    #[error("no assignment is waiting for a choice")]
    NoPendingDisambiguation,

    #[error("element '{0}' is not one of the offered candidates")]
    NotACandidate(String),

    #[error("no placement preview is active")]
    PreviewInactive,

    #[error("unknown zone '{0}'")]
    UnknownZone(String),

    #[error("zone id '{0}' is already in use")]
    DuplicateZone(String),

    #[error("zone '{0}' is axis-aligned and cannot be rotated")]
    ZoneNotRotatable(String),

    #[error("drop point ({x:.2}, {z:.2}) is outside the container")]
    DropOutsideContainer { x: f64, z: f64 },

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl SessionError {
    pub fn zone_rejected(reasons: Vec<ConflictReason>) -> Self {
        Self::ZoneRejected(reasons)
    }

    pub fn invalid_dimensions(message: impl Into<String>) -> Self {
        Self::InvalidDimensions(message.into())
    }
}

impl From<ZoneError> for SessionError {
    fn from(err: ZoneError) -> Self {
        match err {
            ZoneError::InvalidDimensions { width, height } => {
                Self::invalid_dimensions(format!("zone size {width} x {height}"))
            }
            ZoneError::Rejected(reasons) => Self::ZoneRejected(reasons),
            ZoneError::DuplicateId(id) => Self::DuplicateZone(id),
            ZoneError::UnknownZone(id) => Self::UnknownZone(id),
        }
    }
}

/// Where the assignment flow stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MatchState {
    #[default]
    Idle,
    /// Several elements matched; the user has to pick one
    AwaitingDisambiguation {
        template_id: String,
        candidates: Vec<String>,
    },
    Committed(Assignment),
}

/// Outcome of [`Session::auto_place`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoPlacementReport {
    pub placed: Vec<PlacedEntity>,
    /// Templates with several candidates, left for a manual choice
    pub ambiguous: Vec<(String, Vec<String>)>,
    /// Templates with no candidate at all
    pub unmatched: Vec<String>,
}

/// Ghost placement that follows the pointer until committed or aborted
#[derive(Debug, Clone, PartialEq)]
struct Preview {
    template_id: String,
    position: Point3,
}

struct ActivePlan {
    plan: FloorPlan,
    anchor: PlanAnchor,
}

pub struct Session {
    config: EngineConfig,
    catalog: Catalog,
    zones: ZoneLayout,
    active: Option<ActivePlan>,
    matcher: Matcher,
    match_state: MatchState,
    entities: Vec<PlacedEntity>,
    scene: SceneSynchronizer,
    camera: Camera,
    preview: Option<Preview>,
    selection: Option<String>,
}

fn ensure_positive(dimensions: &Dimensions) -> Result<(), SessionError> {
    if dimensions.is_positive() {
        Ok(())
    } else {
        Err(SessionError::invalid_dimensions(format!(
            "{} x {} x {}",
            dimensions.width, dimensions.height, dimensions.depth
        )))
    }
}

fn anchor_plan(plan: &FloorPlan, config: &EngineConfig, container: &Container) -> PlanAnchor {
    let rects: Vec<Rect> = plan.elements.iter().map(|e| e.rect()).collect();
    PlanAnchor::new(&rects, config.unit_scale(), container, config.overlay_fit())
}

/// Wall, window or door entity standing on its plan element
fn structural_entity(
    id: String,
    element: &PlanElement,
    kind: EntityKind,
    anchor: &PlanAnchor,
    config: &EngineConfig,
) -> PlacedEntity {
    let footprint = anchor.rect_to_world(&element.rect());
    let center = footprint.center();
    let height = kind
        .default_dimensions()
        .map(|d| d.height)
        .unwrap_or(config.room.height);
    PlacedEntity::new(id, kind, Point3::new(center.x, 0.0, center.y))
        .with_plan_element(element.id.clone())
        .with_rotation(element.rotation)
        .with_dimensions(Dimensions::new(footprint.width, height, footprint.height))
}

impl Session {
    pub fn new(config: EngineConfig, catalog: Catalog) -> Self {
        let container = config.container();
        let zones = ZoneLayout::new(container).with_ids(ZoneIds {
            prefix: config.ids.zone_prefix.clone(),
            width: config.ids.zone_width,
        });
        let scene = SceneSynchronizer::new(config.unit_scale());
        let camera = Camera::new(config.camera, &container);
        Self {
            config,
            catalog,
            zones,
            active: None,
            matcher: Matcher::new(),
            match_state: MatchState::Idle,
            entities: Vec::new(),
            scene,
            camera,
            preview: None,
            selection: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn container(&self) -> &Container {
        self.zones.container()
    }

    pub fn zones(&self) -> &ZoneLayout {
        &self.zones
    }

    pub fn plan(&self) -> Option<&FloorPlan> {
        self.active.as_ref().map(|a| &a.plan)
    }

    pub fn anchor(&self) -> Option<&PlanAnchor> {
        self.active.as_ref().map(|a| &a.anchor)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn match_state(&self) -> &MatchState {
        &self.match_state
    }

    pub fn entities(&self) -> &[PlacedEntity] {
        &self.entities
    }

    pub fn entity(&self, id: &str) -> Option<&PlacedEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn scene(&self) -> &SceneSynchronizer {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn preview_active(&self) -> bool {
        self.preview.is_some()
    }

    /// Add a template to the catalog. Existing templates are never replaced.
    pub fn register_template(&mut self, template: PlaceableTemplate) -> Result<(), SessionError> {
        let id = template.id.clone();
        self.catalog.register(template)?;
        debug!(template = %id, "template registered");
        Ok(())
    }

    fn template(&self, template_id: &str) -> Result<&PlaceableTemplate, SessionError> {
        self.catalog
            .get(template_id)
            .ok_or_else(|| SessionError::UnknownTemplate(template_id.to_string()))
    }

    fn next_entity_id(&self) -> String {
        next_id(
            self.entities.iter().map(|e| e.id.as_str()),
            &self.config.ids.entity_prefix,
            self.config.ids.entity_width,
        )
    }

    fn entity_index(&self, id: &str) -> Result<usize, SessionError> {
        self.entities
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| SceneError::UnknownEntity(id.to_string()).into())
    }

    /// Push the whole entity list into the scene and frame it
    fn sync_all(&mut self) -> Result<(), SessionError> {
        self.scene
            .apply(self.config.sync.strategy, &self.entities, &self.catalog)?;
        let container = *self.zones.container();
        self.camera.refit(&self.scene, &container);
        Ok(())
    }

    fn commit_entity(&mut self, entity: PlacedEntity) -> Result<PlacedEntity, SessionError> {
        let template = entity
            .template_id
            .as_deref()
            .and_then(|id| self.catalog.get(id));
        self.scene.insert(&entity, template)?;
        debug!(entity = %entity.id, kind = %entity.kind, "entity committed");
        self.entities.push(entity.clone());
        Ok(entity)
    }

    fn remove_entities_where(&mut self, pred: impl Fn(&PlacedEntity) -> bool) -> Vec<String> {
        let removed: Vec<String> = self
            .entities
            .iter()
            .filter(|e| pred(e))
            .map(|e| e.id.clone())
            .collect();
        self.entities.retain(|e| !pred(e));
        for id in &removed {
            self.scene.remove(id);
            if self.selection.as_deref() == Some(id.as_str()) {
                self.selection = None;
            }
        }
        removed
    }

    // --- container and zones ---

    /// Resize the container. Every zone must still fit; the scene is rebuilt.
    ///
    /// With a plan loaded the overlay is re-anchored: structural entities are
    /// regenerated from their elements and plan furniture keeps its place
    /// relative to the plan.
    pub fn set_container(&mut self, width: f64, depth: f64) -> Result<(), SessionError> {
        let container = Container::new(width, depth);
        self.zones.set_container(container)?;

        if let Some(active) = self.active.as_mut() {
            let previous = active.anchor;
            active.anchor = anchor_plan(&active.plan, &self.config, &container);
            for entity in self.entities.iter_mut() {
                let Some(element) = entity
                    .plan_element_id
                    .as_deref()
                    .and_then(|id| active.plan.element(id))
                else {
                    continue;
                };
                if entity.kind.is_structural() {
                    *entity = structural_entity(
                        entity.id.clone(),
                        element,
                        entity.kind,
                        &active.anchor,
                        &self.config,
                    );
                } else if entity.kind == EntityKind::Furniture {
                    let authored = previous.to_authoring(Point::new(entity.x, entity.z));
                    let world = active.anchor.to_world(authored);
                    entity.set_position(Point3::new(world.x, entity.y, world.y));
                }
            }
        }

        let zone_entities = self.zones.entities();
        for zone_entity in zone_entities {
            if let Some(existing) = self.entities.iter_mut().find(|e| e.id == zone_entity.id) {
                *existing = zone_entity;
            }
        }
        info!(width, depth, "container resized");
        self.sync_all()
    }

    /// Validate and commit a zone, then add its floor slab to the scene.
    pub fn add_zone(
        &mut self,
        zone_id: Option<String>,
        name: Option<String>,
        rect: Rect,
        orientation: Orientation,
    ) -> Result<Zone, SessionError> {
        let zone = match self.zones.add(zone_id, name, rect, orientation) {
            Ok(zone) => zone.clone(),
            Err(err) => {
                warn!(error = %err, "zone rejected");
                return Err(err.into());
            }
        };
        let entity = zone.to_entity(self.zones.container());
        if let Err(err) = self.commit_entity(entity) {
            // Keep zones and entities in step when the scene refuses the node.
            // The zone was committed just above, so it is always there to remove.
            self.zones.remove(&zone.zone_id).ok();
            return Err(err);
        }
        info!(zone = %zone.zone_id, "zone added");
        Ok(zone)
    }

    /// Move or resize a zone
    pub fn update_zone(
        &mut self,
        zone_id: &str,
        rect: Rect,
        orientation: Option<Orientation>,
    ) -> Result<Zone, SessionError> {
        let zone = self.zones.update(zone_id, rect, orientation)?.clone();
        let entity = zone.to_entity(self.zones.container());
        let index = self.entity_index(zone_id)?;
        self.scene.update_position(zone_id, entity.position())?;
        if let Some(dimensions) = entity.dimensions {
            self.scene.update_size(zone_id, dimensions)?;
        }
        self.entities[index] = entity;
        Ok(zone)
    }

    pub fn remove_zone(&mut self, zone_id: &str) -> Result<Zone, SessionError> {
        let zone = self.zones.remove(zone_id)?;
        self.remove_entities_where(|e| e.kind == EntityKind::Zone && e.id == zone_id);
        Ok(zone)
    }

    // --- plan ---

    /// Load a plan wholesale.
    ///
    /// Assignments are dropped, furniture is cleared, and the wall, window and
    /// door elements of the plan become structural entities. The scene is then
    /// rebuilt and reframed.
    pub fn load_plan(&mut self, plan: FloorPlan) -> Result<(), SessionError> {
        plan.validate()?;

        let container = *self.zones.container();
        let anchor = anchor_plan(&plan, &self.config, &container);

        let mut entities = self.zones.entities();
        for (element, kind) in plan.structural_elements() {
            let id = next_id(
                entities.iter().map(|e| e.id.as_str()),
                &self.config.ids.entity_prefix,
                self.config.ids.entity_width,
            );
            entities.push(structural_entity(id, element, kind, &anchor, &self.config));
        }

        info!(
            plan = %plan.id,
            elements = plan.elements.len(),
            structural = entities.len() - self.zones.zones().len(),
            "plan loaded"
        );

        self.matcher.reset();
        self.match_state = MatchState::Idle;
        self.preview = None;
        self.scene.clear_preview();
        self.selection = None;
        self.entities = entities;
        self.active = Some(ActivePlan { plan, anchor });
        self.sync_all()
    }

    /// Close the active plan; only zones remain in the scene
    pub fn close_plan(&mut self) -> Result<(), SessionError> {
        self.active = None;
        self.matcher.reset();
        self.match_state = MatchState::Idle;
        self.preview = None;
        self.scene.clear_preview();
        self.selection = None;
        self.entities = self.zones.entities();
        self.sync_all()
    }

    // --- matching ---

    /// Ask for `template` to be matched, optionally to a specific element.
    ///
    /// When several elements match and none was given, the session waits for
    /// [`Session::choose_candidate`] or [`Session::cancel_disambiguation`].
    pub fn request_assign(
        &mut self,
        template_id: &str,
        element_id: Option<&str>,
    ) -> Result<Assignment, SessionError> {
        if let MatchState::AwaitingDisambiguation { template_id, .. } = &self.match_state {
            return Err(SessionError::AwaitingDisambiguation {
                template_id: template_id.clone(),
            });
        }
        let plan = &self.active.as_ref().ok_or(SessionError::NoActivePlan)?.plan;
        let template = self
            .catalog
            .get(template_id)
            .ok_or_else(|| SessionError::UnknownTemplate(template_id.to_string()))?;

        match self.matcher.request_assign(plan, template, element_id) {
            Ok(assignment) => {
                info!(element = %assignment.element_id, template = %assignment.template_id, "assigned");
                self.match_state = MatchState::Committed(assignment.clone());
                Ok(assignment)
            }
            Err(MatchError::AmbiguousMatch {
                template_id,
                candidates,
            }) => {
                debug!(template = %template_id, ?candidates, "awaiting disambiguation");
                self.match_state = MatchState::AwaitingDisambiguation {
                    template_id: template_id.clone(),
                    candidates: candidates.clone(),
                };
                Err(MatchError::AmbiguousMatch {
                    template_id,
                    candidates,
                }
                .into())
            }
            Err(err) => {
                warn!(template = %template_id, error = %err, "assignment refused");
                Err(err.into())
            }
        }
    }

    /// Resolve a pending ambiguous match by picking one of its candidates
    pub fn choose_candidate(&mut self, element_id: &str) -> Result<Assignment, SessionError> {
        let (template_id, candidates) = match &self.match_state {
            MatchState::AwaitingDisambiguation {
                template_id,
                candidates,
            } => (template_id.clone(), candidates),
            _ => return Err(SessionError::NoPendingDisambiguation),
        };
        if !candidates.iter().any(|c| c == element_id) {
            return Err(SessionError::NotACandidate(element_id.to_string()));
        }

        let plan = &self.active.as_ref().ok_or(SessionError::NoActivePlan)?.plan;
        let template = self
            .catalog
            .get(&template_id)
            .ok_or_else(|| SessionError::UnknownTemplate(template_id.clone()))?;
        let assignment = self
            .matcher
            .request_assign(plan, template, Some(element_id))?;
        info!(element = %assignment.element_id, template = %assignment.template_id, "candidate chosen");
        self.match_state = MatchState::Committed(assignment.clone());
        Ok(assignment)
    }

    pub fn cancel_disambiguation(&mut self) -> Result<(), SessionError> {
        match self.match_state {
            MatchState::AwaitingDisambiguation { .. } => {
                self.match_state = MatchState::Idle;
                Ok(())
            }
            _ => Err(SessionError::NoPendingDisambiguation),
        }
    }

    /// Remove a template's assignment together with the furniture placed for it
    pub fn unassign_template(&mut self, template_id: &str) -> Result<Assignment, SessionError> {
        let assignment = self
            .matcher
            .unassign(Unassign::Template(template_id))
            .ok_or_else(|| SessionError::NotAssigned(template_id.to_string()))?;
        self.drop_assignment_entities(&assignment);
        Ok(assignment)
    }

    /// Same as [`Session::unassign_template`], addressed by plan element
    pub fn unassign_element(&mut self, element_id: &str) -> Result<Assignment, SessionError> {
        let assignment = self
            .matcher
            .unassign(Unassign::Element(element_id))
            .ok_or_else(|| SessionError::NotAssigned(element_id.to_string()))?;
        self.drop_assignment_entities(&assignment);
        Ok(assignment)
    }

    fn drop_assignment_entities(&mut self, assignment: &Assignment) {
        let removed = self.remove_entities_where(|e| {
            e.kind == EntityKind::Furniture
                && e.template_id.as_deref() == Some(assignment.template_id.as_str())
        });
        debug!(template = %assignment.template_id, removed = removed.len(), "assignment cancelled");
        if matches!(&self.match_state, MatchState::Committed(a) if a == assignment) {
            self.match_state = MatchState::Idle;
        }
    }

    // --- placement ---

    fn ensure_not_awaiting(&self) -> Result<(), SessionError> {
        match &self.match_state {
            MatchState::AwaitingDisambiguation { template_id, .. } => {
                Err(SessionError::AwaitingDisambiguation {
                    template_id: template_id.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn placed_entity_for(&self, template_id: &str) -> Option<&PlacedEntity> {
        self.entities
            .iter()
            .find(|e| e.kind == EntityKind::Furniture && e.template_id.as_deref() == Some(template_id))
    }

    /// An assigned template is placed at most once
    fn ensure_not_placed(&self, template_id: &str) -> Result<(), SessionError> {
        match self.placed_entity_for(template_id) {
            Some(existing) => Err(SessionError::AlreadyPlaced {
                template_id: template_id.to_string(),
                entity_id: existing.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Place an assigned template on its plan element
    pub fn place_template(&mut self, template_id: &str) -> Result<PlacedEntity, SessionError> {
        self.ensure_not_awaiting()?;
        let active = self.active.as_ref().ok_or(SessionError::NoActivePlan)?;
        let template = self.template(template_id)?;
        let element_id = self
            .matcher
            .element_for(template_id)
            .ok_or_else(|| SessionError::NotAssigned(template_id.to_string()))?;
        self.ensure_not_placed(template_id)?;

        let element = active
            .plan
            .element(element_id)
            .ok_or_else(|| MatchError::UnknownElement(element_id.to_string()))?;
        let center = active.anchor.to_world(element.rect().center());

        let entity = PlacedEntity::new(
            self.next_entity_id(),
            EntityKind::Furniture,
            Point3::new(center.x, 0.0, center.y),
        )
        .with_template(template.id.clone())
        .with_plan_element(element.id.clone())
        .with_rotation(element.rotation)
        .with_dimensions(template.dimensions());

        info!(template = %template_id, element = %element_id, "template placed");
        self.commit_entity(entity)
    }

    /// Place every template that has exactly one possible element.
    ///
    /// Templates that are already placed are skipped. Ambiguous templates are
    /// reported and left alone.
    pub fn auto_place(&mut self) -> Result<AutoPlacementReport, SessionError> {
        self.ensure_not_awaiting()?;
        if self.active.is_none() {
            return Err(SessionError::NoActivePlan);
        }

        let mut report = AutoPlacementReport::default();
        let template_ids: Vec<String> = self.catalog.iter().map(|t| t.id.clone()).collect();

        for template_id in template_ids {
            if self.placed_entity_for(&template_id).is_some() {
                continue;
            }
            if !self.matcher.is_template_assigned(&template_id) {
                let plan = &self.active.as_ref().ok_or(SessionError::NoActivePlan)?.plan;
                let template = self
                    .catalog
                    .get(&template_id)
                    .ok_or_else(|| SessionError::UnknownTemplate(template_id.clone()))?;
                match self.matcher.request_assign(plan, template, None) {
                    Ok(_) => {}
                    Err(MatchError::AmbiguousMatch { candidates, .. }) => {
                        report.ambiguous.push((template_id, candidates));
                        continue;
                    }
                    Err(MatchError::NoCandidate { .. }) => {
                        report.unmatched.push(template_id);
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            report.placed.push(self.place_template(&template_id)?);
        }

        info!(
            placed = report.placed.len(),
            ambiguous = report.ambiguous.len(),
            unmatched = report.unmatched.len(),
            "auto placement finished"
        );
        Ok(report)
    }

    /// World point under the pointer, refused outside the container
    fn drop_point(&self, pointer: Point, viewport: &Viewport) -> Result<Point3, SessionError> {
        let container = self.zones.container();
        let world = pointer_to_world(pointer, viewport, container);
        if container.world_rect().contains(world.floor()) {
            Ok(world)
        } else {
            warn!(x = world.x, z = world.z, "drop outside the container");
            Err(SessionError::DropOutsideContainer {
                x: world.x,
                z: world.z,
            })
        }
    }

    /// Commit an assigned template at a world position
    fn place_at(&mut self, template_id: &str, position: Point3) -> Result<PlacedEntity, SessionError> {
        self.ensure_not_awaiting()?;
        if self.active.is_none() {
            warn!(template = %template_id, "placement without a plan");
            return Err(SessionError::NoActivePlan);
        }
        let template = self.template(template_id)?;
        let element_id = self
            .matcher
            .element_for(template_id)
            .ok_or_else(|| SessionError::NotAssigned(template_id.to_string()))?;
        self.ensure_not_placed(template_id)?;

        let entity = PlacedEntity::new(self.next_entity_id(), EntityKind::Furniture, position)
            .with_template(template.id.clone())
            .with_plan_element(element_id)
            .with_dimensions(template.dimensions());
        info!(template = %template_id, element = %element_id, "template dropped");
        self.commit_entity(entity)
    }

    /// Drop a template at the pointer position
    pub fn drop_template(
        &mut self,
        template_id: &str,
        pointer: Point,
        viewport: &Viewport,
    ) -> Result<PlacedEntity, SessionError> {
        let position = self.drop_point(pointer, viewport)?;
        self.place_at(template_id, position)
    }

    /// Start dragging a template; the ghost starts at the container center
    pub fn begin_preview(&mut self, template_id: &str) -> Result<(), SessionError> {
        let template = self.template(template_id)?.clone();
        let position = Point3::zero();
        self.scene.show_preview(&template, position, 0.0);
        self.preview = Some(Preview {
            template_id: template_id.to_string(),
            position,
        });
        Ok(())
    }

    /// Follow the pointer with the ghost
    pub fn hover(&mut self, pointer: Point, viewport: &Viewport) -> Result<Point3, SessionError> {
        if self.preview.is_none() {
            return Err(SessionError::PreviewInactive);
        }
        let position = pointer_to_world(pointer, viewport, self.zones.container());
        self.scene.move_preview(position);
        if let Some(preview) = self.preview.as_mut() {
            preview.position = position;
        }
        Ok(position)
    }

    /// Drop the dragged template where the ghost is
    pub fn commit_preview(&mut self) -> Result<PlacedEntity, SessionError> {
        let preview = self.preview.clone().ok_or(SessionError::PreviewInactive)?;
        if !self
            .zones
            .container()
            .world_rect()
            .contains(preview.position.floor())
        {
            return Err(SessionError::DropOutsideContainer {
                x: preview.position.x,
                z: preview.position.z,
            });
        }
        let entity = self.place_at(&preview.template_id, preview.position)?;
        self.preview = None;
        self.scene.clear_preview();
        Ok(entity)
    }

    /// Discard the drag; committed entities are untouched
    pub fn abort_preview(&mut self) -> Result<(), SessionError> {
        if self.preview.take().is_none() {
            return Err(SessionError::PreviewInactive);
        }
        self.scene.clear_preview();
        Ok(())
    }

    /// Add a wall, window or door. Missing dimensions take the kind's defaults.
    pub fn add_structure(
        &mut self,
        kind: EntityKind,
        position: Point3,
        rotation: f64,
        dimensions: Option<Dimensions>,
    ) -> Result<PlacedEntity, SessionError> {
        let dimensions = dimensions
            .or_else(|| kind.default_dimensions())
            .ok_or_else(|| SessionError::invalid_dimensions(format!("{kind} has no default size")))?;
        ensure_positive(&dimensions)?;
        let entity = PlacedEntity::new(self.next_entity_id(), kind, position)
            .with_rotation(rotation)
            .with_dimensions(dimensions);
        self.commit_entity(entity)
    }

    // --- entity edits ---

    /// Move an entity. A zone is re-validated against the layout and keeps its size.
    pub fn move_entity(&mut self, id: &str, position: Point3) -> Result<(), SessionError> {
        let index = self.entity_index(id)?;
        if let Some(zone) = self.zones.get(id) {
            let center = world_to_container(position.floor(), self.zones.container());
            let rect = Rect::centered(center, zone.rect.width, zone.rect.height);
            self.update_zone(id, rect, None)?;
            return Ok(());
        }
        self.scene.update_position(id, position)?;
        self.entities[index].set_position(position);
        Ok(())
    }

    /// Rotate an entity; returns the normalized angle
    pub fn rotate_entity(&mut self, id: &str, degrees: f64) -> Result<f64, SessionError> {
        let index = self.entity_index(id)?;
        if self.entities[index].kind == EntityKind::Zone {
            return Err(SessionError::ZoneNotRotatable(id.to_string()));
        }
        let normalized = self.scene.update_rotation(id, degrees)?;
        self.entities[index].rotation = normalized;
        Ok(normalized)
    }

    pub fn resize_entity(&mut self, id: &str, dimensions: Dimensions) -> Result<(), SessionError> {
        ensure_positive(&dimensions)?;
        let index = self.entity_index(id)?;
        if let Some(zone) = self.zones.get(id) {
            let rect = Rect::centered(zone.rect.center(), dimensions.width, dimensions.depth);
            self.update_zone(id, rect, None)?;
            return Ok(());
        }
        self.scene.update_size(id, dimensions)?;
        self.entities[index].dimensions = Some(dimensions);
        Ok(())
    }

    /// Remove an entity. Assignments are kept; zones go through [`Session::remove_zone`].
    pub fn remove_entity(&mut self, id: &str) -> Result<PlacedEntity, SessionError> {
        let index = self.entity_index(id)?;
        if self.entities[index].kind == EntityKind::Zone {
            let entity = self.entities[index].clone();
            self.remove_zone(id)?;
            return Ok(entity);
        }
        let entity = self.entities.remove(index);
        self.scene.remove(id);
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        Ok(entity)
    }

    pub fn select(&mut self, id: &str) -> Result<(), SessionError> {
        self.entity_index(id)?;
        self.selection = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // --- camera ---

    /// Frame everything in the scene
    pub fn fit(&mut self) -> Framing {
        let container = *self.zones.container();
        self.camera.refit(&self.scene, &container)
    }

    pub fn pan(&mut self, direction: PanDirection) -> Framing {
        self.camera.pan(direction)
    }

    pub fn zoom(&mut self, scale: f64) -> Framing {
        self.camera.zoom(scale)
    }

    // --- snapshots ---

    /// Committed entities, ready to be persisted
    pub fn snapshot(&self) -> Vec<PlacedEntity> {
        self.entities.clone()
    }

    pub fn snapshot_json(&self) -> Result<String, SessionError> {
        serde_json::to_string_pretty(&self.entities).map_err(|e| PlanError::from(e).into())
    }

    /// Restore a saved entity list for the active plan.
    ///
    /// Zone entries are taken from the current zone layout, not from the
    /// snapshot. Assignments recorded on furniture are re-committed. Nothing
    /// changes when any step fails.
    pub fn import_snapshot(&mut self, snapshot: Vec<PlacedEntity>) -> Result<(), SessionError> {
        let plan = &self.active.as_ref().ok_or(SessionError::NoActivePlan)?.plan;

        let mut matcher = Matcher::new();
        let mut placed: HashMap<&str, &str> = HashMap::new();
        for entity in &snapshot {
            if let (Some(template_id), Some(element_id)) = (&entity.template_id, &entity.plan_element_id) {
                if entity.kind != EntityKind::Furniture {
                    continue;
                }
                if !self.catalog.contains(template_id) {
                    return Err(SessionError::UnknownTemplate(template_id.clone()));
                }
                if let Some(first) = placed.insert(template_id.as_str(), entity.id.as_str()) {
                    return Err(SessionError::AlreadyPlaced {
                        template_id: template_id.clone(),
                        entity_id: first.to_string(),
                    });
                }
                matcher.restore(
                    plan,
                    &Assignment {
                        element_id: element_id.clone(),
                        template_id: template_id.clone(),
                    },
                )?;
            }
        }
        for entity in &snapshot {
            if let Some(dimensions) = &entity.dimensions {
                ensure_positive(dimensions)?;
            }
        }

        let mut entities = self.zones.entities();
        entities.extend(
            snapshot
                .into_iter()
                .filter(|e| e.kind != EntityKind::Zone)
                .map(|e| {
                    let rotation = e.rotation;
                    e.with_rotation(rotation)
                }),
        );

        self.scene.bulk_replace(&entities, &self.catalog)?;
        info!(entities = entities.len(), assignments = matcher.len(), "snapshot imported");

        self.matcher = matcher;
        self.match_state = MatchState::Idle;
        self.entities = entities;
        self.selection = None;
        let container = *self.zones.container();
        self.camera.refit(&self.scene, &container);
        Ok(())
    }

    pub fn import_snapshot_json(&mut self, json: &str) -> Result<(), SessionError> {
        let snapshot: Vec<PlacedEntity> = serde_json::from_str(json).map_err(PlanError::from)?;
        self.import_snapshot(snapshot)
    }

    /// Every cross-component invariant at once
    pub fn check_invariants(&self) -> bool {
        self.zones.check_invariants()
            && self.matcher.check_invariants()
            && self.scene.check_invariants(&self.entities)
    }
}
