//! Coordinate spaces and the transforms between them.
//!
//! ## Spaces
//!
//! - **Authoring**: plan units (100 per meter by default), arbitrary origin.
//! - **Container-local**: meters, origin at the container's top-left corner.
//!   This is where zones are edited.
//! - **World**: meters, origin at the container center. On the floor plane
//!   `x` grows to the right and `z` grows toward the viewer; `y` is up.
//! - **Scene**: engine units, world scaled by `scene_units_per_meter`.
//!
//! ## Rotation Convention
//!
//! Floor rotations are clockwise positive in degrees when looking down at
//! the floor, with the second axis pointing toward the viewer (the same
//! orientation as SVG's y-down). Angles stored on entities are normalized
//! to `[0, 360)`.

use serde::{Deserialize, Serialize};

use super::types::{Container, Point, Point3, Rect};

/// Normalize an angle in degrees to `[0, 360)`
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// A 2D rotation around a center point on the floor plane.
#[derive(Debug, Clone, Copy)]
pub struct RotationTransform {
    /// Rotation angle in degrees (clockwise positive)
    pub angle_degrees: f64,
    /// Center point of rotation
    pub center: Point,
}

impl RotationTransform {
    pub fn new(angle_degrees: f64, center: Point) -> Self {
        Self {
            angle_degrees,
            center,
        }
    }

    /// Rotation about the center of a rectangle
    pub fn about_center(angle_degrees: f64, rect: &Rect) -> Self {
        Self::new(angle_degrees, rect.center())
    }

    /// True when the rotation is a whole number of turns.
    pub fn is_identity(&self) -> bool {
        normalize_degrees(self.angle_degrees).abs() < f64::EPSILON
    }

    /// Rotate a point around the center.
    ///
    /// ```text
    /// x' = cx + (x - cx) * cos(θ) - (y - cy) * sin(θ)
    /// y' = cy + (x - cx) * sin(θ) + (y - cy) * cos(θ)
    /// ```
    pub fn transform_point(&self, point: Point) -> Point {
        if self.is_identity() {
            return point;
        }

        let radians = self.angle_degrees.to_radians();
        let cos_a = radians.cos();
        let sin_a = radians.sin();

        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;

        Point {
            x: self.center.x + dx * cos_a - dy * sin_a,
            y: self.center.y + dx * sin_a + dy * cos_a,
        }
    }

    /// Loose bounds: the axis-aligned box around the four rotated corners.
    pub fn transform_bounds(&self, bounds: &Rect) -> Rect {
        if self.is_identity() {
            return *bounds;
        }

        let corners = [
            Point::new(bounds.x, bounds.y),
            Point::new(bounds.right(), bounds.y),
            Point::new(bounds.x, bounds.bottom()),
            Point::new(bounds.right(), bounds.bottom()),
        ];

        let rotated: Vec<Point> = corners.iter().map(|p| self.transform_point(*p)).collect();

        let min_x = rotated.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = rotated.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = rotated.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = rotated.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Floor footprint of an object centered on `center` with the given size and rotation
pub fn rotated_footprint(center: Point, width: f64, depth: f64, rotation_degrees: f64) -> Rect {
    let rect = Rect::centered(center, width, depth);
    RotationTransform::new(rotation_degrees, center).transform_bounds(&rect)
}

/// Unit conversion factors between authoring, world and scene space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitScale {
    pub authoring_units_per_meter: f64,
    pub scene_units_per_meter: f64,
}

impl Default for UnitScale {
    fn default() -> Self {
        Self {
            authoring_units_per_meter: 100.0,
            scene_units_per_meter: 1.0,
        }
    }
}

impl UnitScale {
    pub fn new(authoring_units_per_meter: f64, scene_units_per_meter: f64) -> Self {
        Self {
            authoring_units_per_meter,
            scene_units_per_meter,
        }
    }

    pub fn authoring_to_world(&self, p: Point) -> Point {
        Point::new(
            p.x / self.authoring_units_per_meter,
            p.y / self.authoring_units_per_meter,
        )
    }

    pub fn world_to_authoring(&self, p: Point) -> Point {
        Point::new(
            p.x * self.authoring_units_per_meter,
            p.y * self.authoring_units_per_meter,
        )
    }

    /// Convert a single authoring length to meters
    pub fn authoring_length(&self, length: f64) -> f64 {
        length / self.authoring_units_per_meter
    }

    pub fn world_to_scene(&self, p: Point3) -> Point3 {
        let k = self.scene_units_per_meter;
        Point3::new(p.x * k, p.y * k, p.z * k)
    }

    pub fn scene_to_world(&self, p: Point3) -> Point3 {
        let k = self.scene_units_per_meter;
        Point3::new(p.x / k, p.y / k, p.z / k)
    }
}

/// Screen rectangle of the 3D viewport, in client pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Map a pointer position (client pixels) onto the world floor plane.
///
/// The viewport is stretched over the whole container, so the viewport
/// center lands on the world origin.
pub fn pointer_to_world(pointer: Point, viewport: &Viewport, container: &Container) -> Point3 {
    let x = (pointer.x - viewport.left) / viewport.width * container.width - container.width / 2.0;
    let z =
        (pointer.y - viewport.top) / viewport.height * container.height - container.height / 2.0;
    Point3::new(x, 0.0, z)
}

/// Inverse of [`pointer_to_world`]; the vertical coordinate is ignored.
pub fn world_to_pointer(world: Point3, viewport: &Viewport, container: &Container) -> Point {
    Point::new(
        (world.x + container.width / 2.0) / container.width * viewport.width + viewport.left,
        (world.z + container.height / 2.0) / container.height * viewport.height + viewport.top,
    )
}

/// Container-local floor point to world floor point (`x`, `z`)
pub fn container_to_world(p: Point, container: &Container) -> Point {
    Point::new(p.x - container.width / 2.0, p.y - container.height / 2.0)
}

pub fn world_to_container(p: Point, container: &Container) -> Point {
    Point::new(p.x + container.width / 2.0, p.y + container.height / 2.0)
}

/// Anchors an authored plan onto the container.
///
/// The bounding box of the plan is centered on the container center, then
/// converted to meters. With a fit margin the plan is additionally scaled so
/// it fills `margin` of the container along its tighter axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanAnchor {
    bounds: Option<Rect>,
    units: UnitScale,
    fit: f64,
}

impl PlanAnchor {
    pub fn new<'a>(
        rects: impl IntoIterator<Item = &'a Rect>,
        units: UnitScale,
        container: &Container,
        fit_margin: Option<f64>,
    ) -> Self {
        let bounds = Rect::union_all(rects);

        let fit = match (bounds, fit_margin) {
            (Some(b), Some(margin)) if b.has_positive_size() => {
                let plan_w = units.authoring_length(b.width);
                let plan_d = units.authoring_length(b.height);
                (container.width / plan_w).min(container.height / plan_d) * margin
            }
            _ => 1.0,
        };

        Self { bounds, units, fit }
    }

    /// Bounding box of the plan in authoring space
    pub fn plan_bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Meters per authoring unit, including the fit factor
    pub fn scale(&self) -> f64 {
        self.fit / self.units.authoring_units_per_meter
    }

    fn plan_center(&self) -> Point {
        self.bounds.map(|b| b.center()).unwrap_or_default()
    }

    /// Authoring point to world floor point
    pub fn to_world(&self, p: Point) -> Point {
        let c = self.plan_center();
        let s = self.scale();
        Point::new((p.x - c.x) * s, (p.y - c.y) * s)
    }

    pub fn to_authoring(&self, p: Point) -> Point {
        let c = self.plan_center();
        let s = self.scale();
        Point::new(p.x / s + c.x, p.y / s + c.y)
    }

    /// Authoring rectangle to world footprint (unrotated)
    pub fn rect_to_world(&self, rect: &Rect) -> Rect {
        let s = self.scale();
        Rect::centered(self.to_world(rect.center()), rect.width * s, rect.height * s)
    }
}
