//! Zones of the store floor and the container they are laid out in

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityKind, PlacedEntity};
use crate::geometry::{
    container_to_world, suggest_free_slots, validate_zone, validate_zone_update, ConflictReason,
    Container, Dimensions, Point3, Rect,
};
use crate::ids::next_id;

/// Height of the floor slab a zone is drawn as
pub const ZONE_SLAB_HEIGHT: f64 = 0.02;

/// Facing of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub fn degrees(&self) -> f64 {
        match self {
            Orientation::North => 0.0,
            Orientation::East => 90.0,
            Orientation::South => 180.0,
            Orientation::West => 270.0,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::North => "north",
            Orientation::East => "east",
            Orientation::South => "south",
            Orientation::West => "west",
        };
        f.write_str(s)
    }
}

impl FromStr for Orientation {
    type Err = String;

    /// Accepts English names and the French labels used by the zone editor
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "north" | "nord" | "n" => Ok(Orientation::North),
            "east" | "est" | "e" => Ok(Orientation::East),
            "south" | "sud" | "s" => Ok(Orientation::South),
            "west" | "ouest" | "o" | "w" => Ok(Orientation::West),
            other => Err(format!("unknown orientation '{other}'")),
        }
    }
}

/// A committed zone in container-local meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub zone_id: String,
    pub name: String,
    pub rect: Rect,
    #[serde(default)]
    pub orientation: Orientation,
}

impl Zone {
    /// The scene entity representing this zone, centered on the zone in world space
    pub fn to_entity(&self, container: &Container) -> PlacedEntity {
        let center = container_to_world(self.rect.center(), container);
        PlacedEntity::new(
            self.zone_id.clone(),
            EntityKind::Zone,
            Point3::new(center.x, 0.0, center.y),
        )
        .with_dimensions(Dimensions::new(
            self.rect.width,
            ZONE_SLAB_HEIGHT,
            self.rect.height,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    #[error("zone size must be positive, got {width} x {height}")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("zone rejected: {}", join_reasons(.0))]
    Rejected(Vec<ConflictReason>),

    #[error("zone id '{0}' is already in use")]
    DuplicateId(String),

    #[error("unknown zone '{0}'")]
    UnknownZone(String),
}

pub(crate) fn join_reasons(reasons: &[ConflictReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Zone prefix and counter width
#[derive(Debug, Clone)]
pub struct ZoneIds {
    pub prefix: String,
    pub width: usize,
}

impl Default for ZoneIds {
    fn default() -> Self {
        Self {
            prefix: "Z".to_string(),
            width: 3,
        }
    }
}

/// The container and its committed zones.
///
/// Every mutation is validated first, so committed zones always lie inside
/// the container and never overlap strictly.
#[derive(Debug, Clone)]
pub struct ZoneLayout {
    container: Container,
    zones: Vec<Zone>,
    ids: ZoneIds,
}

impl ZoneLayout {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            zones: Vec::new(),
            ids: ZoneIds::default(),
        }
    }

    pub fn with_ids(mut self, ids: ZoneIds) -> Self {
        self.ids = ids;
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.zone_id == zone_id)
    }

    fn existing(&self) -> impl Iterator<Item = (&str, &Rect)> {
        self.zones.iter().map(|z| (z.zone_id.as_str(), &z.rect))
    }

    /// Validate a candidate without committing it
    pub fn check(&self, rect: &Rect) -> Vec<ConflictReason> {
        validate_zone(rect, &self.container, self.existing())
    }

    /// Next free zone id
    pub fn next_zone_id(&self) -> String {
        next_id(
            self.zones.iter().map(|z| z.zone_id.as_str()),
            &self.ids.prefix,
            self.ids.width,
        )
    }

    /// Validate and commit a new zone. Without an explicit id the next free one is used.
    pub fn add(
        &mut self,
        zone_id: Option<String>,
        name: Option<String>,
        rect: Rect,
        orientation: Orientation,
    ) -> Result<&Zone, ZoneError> {
        ensure_positive(&rect)?;

        let zone_id = match zone_id {
            Some(id) if self.get(&id).is_some() => return Err(ZoneError::DuplicateId(id)),
            Some(id) => id,
            None => self.next_zone_id(),
        };

        let reasons = self.check(&rect);
        if !reasons.is_empty() {
            return Err(ZoneError::Rejected(reasons));
        }

        let name = name.unwrap_or_else(|| format!("Zone {zone_id}"));
        self.zones.push(Zone {
            zone_id,
            name,
            rect,
            orientation,
        });
        let index = self.zones.len() - 1;
        Ok(&self.zones[index])
    }

    /// Move or resize a zone. The zone is not compared against itself.
    pub fn update(
        &mut self,
        zone_id: &str,
        rect: Rect,
        orientation: Option<Orientation>,
    ) -> Result<&Zone, ZoneError> {
        ensure_positive(&rect)?;

        let index = self
            .zones
            .iter()
            .position(|z| z.zone_id == zone_id)
            .ok_or_else(|| ZoneError::UnknownZone(zone_id.to_string()))?;

        let reasons = validate_zone_update(zone_id, &rect, &self.container, self.existing());
        if !reasons.is_empty() {
            return Err(ZoneError::Rejected(reasons));
        }

        let zone = &mut self.zones[index];
        zone.rect = rect;
        if let Some(orientation) = orientation {
            zone.orientation = orientation;
        }
        Ok(&self.zones[index])
    }

    pub fn remove(&mut self, zone_id: &str) -> Result<Zone, ZoneError> {
        let index = self
            .zones
            .iter()
            .position(|z| z.zone_id == zone_id)
            .ok_or_else(|| ZoneError::UnknownZone(zone_id.to_string()))?;
        Ok(self.zones.remove(index))
    }

    /// Change the container size. Refused when a committed zone would no longer fit.
    pub fn set_container(&mut self, container: Container) -> Result<(), ZoneError> {
        if !(container.width > 0.0 && container.height > 0.0) {
            return Err(ZoneError::InvalidDimensions {
                width: container.width,
                height: container.height,
            });
        }
        for zone in &self.zones {
            let reasons = validate_zone(&zone.rect, &container, std::iter::empty());
            if !reasons.is_empty() {
                return Err(ZoneError::Rejected(reasons));
            }
        }
        self.container = container;
        Ok(())
    }

    /// Suggested rectangles for a new zone that are legal right now
    pub fn suggestions(&self) -> Vec<Rect> {
        suggest_free_slots(&self.container)
            .into_iter()
            .filter(|r| self.check(r).is_empty())
            .collect()
    }

    /// Zone entities for the scene
    pub fn entities(&self) -> Vec<PlacedEntity> {
        self.zones
            .iter()
            .map(|z| z.to_entity(&self.container))
            .collect()
    }

    /// True while every zone is inside the container and no two zones overlap
    pub fn check_invariants(&self) -> bool {
        let inside = self
            .zones
            .iter()
            .all(|z| self.container.rect().contains_rect(&z.rect));
        let disjoint = self.zones.iter().enumerate().all(|(i, a)| {
            self.zones[i + 1..]
                .iter()
                .all(|b| !a.rect.overlaps_strict(&b.rect))
        });
        inside && disjoint
    }
}

fn ensure_positive(rect: &Rect) -> Result<(), ZoneError> {
    if rect.has_positive_size() {
        Ok(())
    } else {
        Err(ZoneError::InvalidDimensions {
            width: rect.width,
            height: rect.height,
        })
    }
}
