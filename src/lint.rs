//! Lint checks for a layout session.
//!
//! Detection only: nothing here moves or removes anything. Checks cover
//! overlapping furniture footprints, footprints leaving the container,
//! overlapping zones, and furniture whose plan assignment no longer exists.

use std::fmt;

use crate::entity::{EntityKind, PlacedEntity};
use crate::geometry::Rect;
use crate::session::Session;

/// Footprint overlap below this area (m²) is treated as touching
const OVERLAP_TOLERANCE: f64 = 1e-6;

/// A lint warning about a layout defect
#[derive(Debug, Clone, PartialEq)]
pub struct LintWarning {
    pub category: LintCategory,
    pub message: String,
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    Overlap,
    Containment,
    Zone,
    Assignment,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::Overlap => write!(f, "overlap"),
            LintCategory::Containment => write!(f, "containment"),
            LintCategory::Zone => write!(f, "zone"),
            LintCategory::Assignment => write!(f, "assignment"),
        }
    }
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Run all lint checks on a session.
pub fn check(session: &Session) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    check_overlaps(session, &mut warnings);
    check_containment(session, &mut warnings);
    check_zones(session, &mut warnings);
    check_assignments(session, &mut warnings);
    warnings
}

fn footprints(session: &Session) -> Vec<(&PlacedEntity, Rect)> {
    session
        .entities()
        .iter()
        .filter(|e| e.kind != EntityKind::Zone)
        .filter_map(|e| e.footprint().map(|r| (e, r)))
        .collect()
}

fn intersection_area(a: &Rect, b: &Rect) -> f64 {
    let w = a.right().min(b.right()) - a.x.max(b.x);
    let h = a.bottom().min(b.bottom()) - a.y.max(b.y);
    if w > 0.0 && h > 0.0 {
        w * h
    } else {
        0.0
    }
}

// ── Overlaps ──────────────────────────────────────────────────────

/// Furniture footprints that overlap each other. Walls, windows and doors
/// are allowed to meet, so only pairs with at least one furniture piece count.
fn check_overlaps(session: &Session, warnings: &mut Vec<LintWarning>) {
    let prints = footprints(session);
    for (i, (a, ra)) in prints.iter().enumerate() {
        for (b, rb) in &prints[i + 1..] {
            if a.kind != EntityKind::Furniture && b.kind != EntityKind::Furniture {
                continue;
            }
            let area = intersection_area(ra, rb);
            if area > OVERLAP_TOLERANCE {
                warnings.push(LintWarning {
                    category: LintCategory::Overlap,
                    message: format!(
                        "\"{}\" and \"{}\" overlap by {:.2} m²",
                        a.id, b.id, area
                    ),
                });
            }
        }
    }
}

// ── Containment ───────────────────────────────────────────────────

fn check_containment(session: &Session, warnings: &mut Vec<LintWarning>) {
    let room = session.container().world_rect();
    for (entity, rect) in footprints(session) {
        if entity.kind.is_structural() {
            continue;
        }
        if !room.contains_rect(&rect) {
            warnings.push(LintWarning {
                category: LintCategory::Containment,
                message: format!("\"{}\" extends outside the container", entity.id),
            });
        }
    }
}

// ── Zones ─────────────────────────────────────────────────────────

fn check_zones(session: &Session, warnings: &mut Vec<LintWarning>) {
    let zones = session.zones().zones();
    let container = session.container().rect();
    for (i, a) in zones.iter().enumerate() {
        if !container.contains_rect(&a.rect) {
            warnings.push(LintWarning {
                category: LintCategory::Zone,
                message: format!("zone \"{}\" is outside the container", a.zone_id),
            });
        }
        for b in &zones[i + 1..] {
            if a.rect.overlaps_strict(&b.rect) {
                warnings.push(LintWarning {
                    category: LintCategory::Zone,
                    message: format!("zones \"{}\" and \"{}\" overlap", a.zone_id, b.zone_id),
                });
            }
        }
    }
}

// ── Assignments ───────────────────────────────────────────────────

/// Furniture placed for a plan element it is no longer assigned to
fn check_assignments(session: &Session, warnings: &mut Vec<LintWarning>) {
    let matcher = session.matcher();
    for entity in session.entities() {
        if entity.kind != EntityKind::Furniture {
            continue;
        }
        let (Some(template_id), Some(element_id)) = (&entity.template_id, &entity.plan_element_id)
        else {
            continue;
        };
        if matcher.template_for(element_id) != Some(template_id.as_str()) {
            warnings.push(LintWarning {
                category: LintCategory::Assignment,
                message: format!(
                    "\"{}\" was placed for element \"{}\" but template \"{}\" is no longer assigned to it",
                    entity.id, element_id, template_id
                ),
            });
        }
    }
}
