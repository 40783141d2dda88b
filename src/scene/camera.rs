//! Orbit camera framing for the scene

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sync::SceneSynchronizer;
use crate::geometry::{Container, Point3, Rect};

/// Camera tuning, all distances in world meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Closest the camera may sit to its target after a refit
    pub min_distance: f64,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    /// Multiplier applied to the content size to get the eye distance
    pub fit_factor: f64,
    pub pan_step: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            min_distance: 3.0,
            elevation_deg: 45.0,
            azimuth_deg: 45.0,
            fit_factor: 1.5,
            pan_step: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
    /// Back to the last fitted framing
    Reset,
}

/// Eye and orbit target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub eye: Point3,
    pub target: Point3,
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct Camera {
    settings: CameraSettings,
    current: Framing,
    home: Framing,
}

impl Camera {
    pub fn new(settings: CameraSettings, container: &Container) -> Self {
        let framing = frame_bounds(&settings, &container.world_rect());
        Self {
            settings,
            current: framing,
            home: framing,
        }
    }

    pub fn framing(&self) -> &Framing {
        &self.current
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Frame every node of the scene. An empty scene frames the container.
    pub fn refit(&mut self, scene: &SceneSynchronizer, container: &Container) -> Framing {
        let bounds = scene.world_bounds().unwrap_or_else(|| container.world_rect());
        let framing = frame_bounds(&self.settings, &bounds);
        debug!(
            distance = framing.distance,
            target.x = framing.target.x,
            target.z = framing.target.z,
            "camera refit"
        );
        self.current = framing;
        self.home = framing;
        framing
    }

    /// Slide eye and target together on the floor plane
    pub fn pan(&mut self, direction: PanDirection) -> Framing {
        let step = self.settings.pan_step;
        let (dx, dz) = match direction {
            PanDirection::Up => (0.0, -step),
            PanDirection::Down => (0.0, step),
            PanDirection::Left => (-step, 0.0),
            PanDirection::Right => (step, 0.0),
            PanDirection::Reset => {
                self.current = self.home;
                return self.current;
            }
        };
        self.current.eye = self.current.eye.offset(dx, 0.0, dz);
        self.current.target = self.current.target.offset(dx, 0.0, dz);
        self.current
    }

    /// Move the eye toward (`scale > 1`) or away from the target. Non-positive scales are ignored.
    pub fn zoom(&mut self, scale: f64) -> Framing {
        if scale > 0.0 && scale.is_finite() {
            let distance = self.current.distance / scale;
            self.current.eye = eye_position(&self.settings, self.current.target, distance);
            self.current.distance = distance;
        }
        self.current
    }
}

fn eye_position(settings: &CameraSettings, target: Point3, distance: f64) -> Point3 {
    let el = settings.elevation_deg.to_radians();
    let az = settings.azimuth_deg.to_radians();
    target.offset(
        distance * el.cos() * az.sin(),
        distance * el.sin(),
        distance * el.cos() * az.cos(),
    )
}

/// Framing for a floor rectangle in world meters
pub fn frame_bounds(settings: &CameraSettings, bounds: &Rect) -> Framing {
    let center = bounds.center();
    let target = Point3::new(center.x, 0.0, center.y);
    let size = bounds.width.max(bounds.height);
    let distance = (size * settings.fit_factor).max(settings.min_distance);
    Framing {
        eye: eye_position(settings, target, distance),
        target,
        distance,
    }
}
