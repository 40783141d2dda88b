//! Geometry: rectangles, bounds validation and coordinate transforms

pub mod bounds;
pub mod transform;
pub mod types;

pub use bounds::{suggest_free_slots, validate_zone, validate_zone_update, ConflictReason};
pub use transform::{
    container_to_world, normalize_degrees, pointer_to_world, rotated_footprint,
    world_to_container, world_to_pointer, PlanAnchor, RotationTransform, UnitScale, Viewport,
};
pub use types::{Container, Dimensions, Point, Point3, Rect};
