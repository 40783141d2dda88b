//! Entities placed in the 3D scene

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{normalize_degrees, rotated_footprint, Dimensions, Point, Point3, Rect};

/// What a placed entity represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Zone,
    Furniture,
    Wall,
    Window,
    Door,
}

impl EntityKind {
    pub fn is_structural(&self) -> bool {
        matches!(self, EntityKind::Wall | EntityKind::Window | EntityKind::Door)
    }

    /// Size used when a structural piece is dropped without explicit dimensions
    pub fn default_dimensions(&self) -> Option<Dimensions> {
        match self {
            EntityKind::Wall => Some(Dimensions::new(5.0, 3.0, 0.2)),
            EntityKind::Window => Some(Dimensions::new(2.0, 1.5, 0.1)),
            EntityKind::Door => Some(Dimensions::new(1.0, 2.0, 0.1)),
            EntityKind::Zone | EntityKind::Furniture => None,
        }
    }

    /// Element type name used for palette lookups
    pub fn type_name(&self) -> &'static str {
        match self {
            EntityKind::Zone => "zone",
            EntityKind::Furniture => "furniture",
            EntityKind::Wall => "wall",
            EntityKind::Window => "window",
            EntityKind::Door => "door",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// An entity committed to the scene, in world meters.
///
/// `y` is the height of the entity's base above the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedEntity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_element_id: Option<String>,
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl PlacedEntity {
    pub fn new(id: impl Into<String>, kind: EntityKind, position: Point3) -> Self {
        Self {
            id: id.into(),
            template_id: None,
            plan_element_id: None,
            kind,
            x: position.x,
            y: position.y,
            z: position.z,
            rotation: 0.0,
            dimensions: None,
        }
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_plan_element(mut self, element_id: impl Into<String>) -> Self {
        self.plan_element_id = Some(element_id.into());
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = normalize_degrees(degrees);
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn set_position(&mut self, position: Point3) {
        self.x = position.x;
        self.y = position.y;
        self.z = position.z;
    }

    /// Rotated floor footprint, when the entity has dimensions
    pub fn footprint(&self) -> Option<Rect> {
        self.dimensions.map(|d| {
            rotated_footprint(Point::new(self.x, self.z), d.width, d.depth, self.rotation)
        })
    }
}
