//! Engine configuration
//!
//! Every section and field is optional in the TOML file; anything left out
//! takes its default.
//!
//! ```toml
//! [room]
//! width = 30
//! depth = 18
//!
//! [camera]
//! fit_factor = 1.2
//!
//! [sync]
//! strategy = "reconcile"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Container, UnitScale};
use crate::scene::{CameraSettings, SyncStrategy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// The store floor, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            width: 20.0,
            depth: 20.0,
            height: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitsConfig {
    pub authoring_units_per_meter: f64,
    pub scene_units_per_meter: f64,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        let scale = UnitScale::default();
        Self {
            authoring_units_per_meter: scale.authoring_units_per_meter,
            scene_units_per_meter: scale.scene_units_per_meter,
        }
    }
}

/// Prefixes and counter widths for generated ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    pub zone_prefix: String,
    pub zone_width: usize,
    pub entity_prefix: String,
    pub entity_width: usize,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            zone_prefix: "Z".to_string(),
            zone_width: 3,
            entity_prefix: "P".to_string(),
            entity_width: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub strategy: SyncStrategy,
}

/// How an authored plan is laid over the room
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Scale the plan to fill the room instead of using its true size
    pub fit_to_container: bool,
    /// Share of the room the fitted plan occupies
    pub margin: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fit_to_container: false,
            margin: 0.8,
        }
    }
}

/// Configuration for a layout session
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub room: RoomConfig,
    pub units: UnitsConfig,
    pub camera: CameraSettings,
    pub ids: IdConfig,
    pub sync: SyncConfig,
    pub overlay: OverlayConfig,
}

impl EngineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes and scales that would break the transforms
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    message: format!("must be a positive number, got {value}"),
                })
            }
        }

        positive("room.width", self.room.width)?;
        positive("room.depth", self.room.depth)?;
        positive("room.height", self.room.height)?;
        positive(
            "units.authoring_units_per_meter",
            self.units.authoring_units_per_meter,
        )?;
        positive("units.scene_units_per_meter", self.units.scene_units_per_meter)?;
        positive("camera.fit_factor", self.camera.fit_factor)?;
        positive("camera.pan_step", self.camera.pan_step)?;
        positive("overlay.margin", self.overlay.margin)?;
        if self.camera.min_distance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "camera.min_distance",
                message: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Set the room size
    pub fn with_room(mut self, width: f64, depth: f64) -> Self {
        self.room.width = width;
        self.room.depth = depth;
        self
    }

    pub fn with_units(mut self, authoring_units_per_meter: f64, scene_units_per_meter: f64) -> Self {
        self.units = UnitsConfig {
            authoring_units_per_meter,
            scene_units_per_meter,
        };
        self
    }

    pub fn with_sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.sync.strategy = strategy;
        self
    }

    /// Fit authored plans to the room with the given margin
    pub fn with_overlay_fit(mut self, margin: f64) -> Self {
        self.overlay = OverlayConfig {
            fit_to_container: true,
            margin,
        };
        self
    }

    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    pub fn container(&self) -> Container {
        Container::new(self.room.width, self.room.depth)
    }

    pub fn unit_scale(&self) -> UnitScale {
        UnitScale::new(
            self.units.authoring_units_per_meter,
            self.units.scene_units_per_meter,
        )
    }

    /// Fit margin for plan anchoring, `None` for true scale
    pub fn overlay_fit(&self) -> Option<f64> {
        self.overlay
            .fit_to_container
            .then_some(self.overlay.margin)
    }
}
