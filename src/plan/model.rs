//! Floor plan documents as authored in the 2D editor

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PlanError;
use crate::entity::EntityKind;
use crate::geometry::Rect;

/// Element types that represent a furniture slot a template can be matched to
pub const FURNITURE_ELEMENT_TYPES: &[&str] = &[
    "shelf",
    "display",
    "table",
    "fridge",
    "planogram",
    "gondola",
    "counter",
    "cashier",
    "rack",
    "mannequin",
    "cube",
];

/// Check whether an element type is a furniture slot
pub fn is_furniture_slot(element_type: &str) -> bool {
    FURNITURE_ELEMENT_TYPES.contains(&element_type)
}

/// Structural entity kind for `wall`, `window` and `door` elements
pub fn structural_kind(element_type: &str) -> Option<EntityKind> {
    match element_type {
        "wall" => Some(EntityKind::Wall),
        "window" => Some(EntityKind::Window),
        "door" => Some(EntityKind::Door),
        _ => None,
    }
}

/// One element of a floor plan, in authoring units.
///
/// `x`/`y` is the top-left corner of the unrotated element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl PlanElement {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            name: None,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            rotation: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// A blank name counts as no name
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Name when present, otherwise the type
    pub fn label(&self) -> &str {
        self.effective_name().unwrap_or(&self.element_type)
    }

    pub fn is_furniture_slot(&self) -> bool {
        is_furniture_slot(&self.element_type)
    }
}

/// A floor plan document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlan {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub elements: Vec<PlanElement>,
}

impl FloorPlan {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: None,
            updated_at: None,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: PlanElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn element(&self, id: &str) -> Option<&PlanElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn furniture_slots(&self) -> impl Iterator<Item = &PlanElement> {
        self.elements.iter().filter(|e| e.is_furniture_slot())
    }

    pub fn structural_elements(&self) -> impl Iterator<Item = (&PlanElement, EntityKind)> {
        self.elements
            .iter()
            .filter_map(|e| structural_kind(&e.element_type).map(|k| (e, k)))
    }

    /// Parse and validate a plan from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self, PlanError> {
        let plan: FloorPlan = serde_json::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Load a plan from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
        Self::from_json_str(&content)
    }

    /// Element ids must be unique and every element must have a positive size.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.id.as_str()) {
                return Err(PlanError::DuplicateElement {
                    id: element.id.clone(),
                });
            }
            if !element.rect().has_positive_size() {
                return Err(PlanError::invalid_element(
                    &element.id,
                    format!(
                        "width and height must be positive, got {} x {}",
                        element.width, element.height
                    ),
                ));
            }
            if !element.x.is_finite() || !element.y.is_finite() || !element.rotation.is_finite() {
                return Err(PlanError::invalid_element(
                    &element.id,
                    "coordinates must be finite",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_document() {
        let json = r#"{
            "id": "plan-1",
            "name": "Ground floor",
            "updatedAt": "2024-03-01T10:00:00Z",
            "elements": [
                {"id": "e1", "type": "shelf", "x": 0, "y": 0, "width": 200, "height": 60},
                {"id": "e2", "type": "wall", "name": "North wall", "x": 0, "y": 0, "width": 1000, "height": 20, "rotation": 90}
            ]
        }"#;
        let plan: FloorPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.elements.len(), 2);
        assert!(plan.updated_at.is_some());
        assert_eq!(plan.elements[0].rotation, 0.0);
        assert_eq!(plan.elements[1].effective_name(), Some("North wall"));
        assert_eq!(plan.furniture_slots().count(), 1);

        let structural: Vec<_> = plan.structural_elements().map(|(e, k)| (e.id.as_str(), k)).collect();
        assert_eq!(structural, vec![("e2", EntityKind::Wall)]);
    }

    #[test]
    fn test_validate_rejects_degenerate_elements() {
        let json = r#"{"id": "p", "name": "n", "elements": [
            {"id": "e1", "type": "shelf", "x": 0, "y": 0, "width": 0, "height": 60}
        ]}"#;
        let err = FloorPlan::from_json_str(json).unwrap_err();
        assert!(matches!(err, PlanError::InvalidElement { ref id, .. } if id == "e1"));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let plan = FloorPlan::new("p", "n")
            .with_element(PlanElement::new("e1", "shelf", Rect::new(0.0, 0.0, 1.0, 1.0)))
            .with_element(PlanElement::new("e1", "table", Rect::new(5.0, 0.0, 1.0, 1.0)));
        assert!(matches!(
            plan.validate(),
            Err(PlanError::DuplicateElement { .. })
        ));
    }

    #[test]
    fn test_blank_name_is_no_name() {
        let e = PlanElement::new("e1", "shelf", Rect::new(0.0, 0.0, 1.0, 1.0)).with_name("  ");
        assert_eq!(e.effective_name(), None);
        assert_eq!(e.label(), "shelf");
    }

    #[test]
    fn test_furniture_slot_types() {
        assert!(is_furniture_slot("gondola"));
        assert!(is_furniture_slot("cashier"));
        assert!(!is_furniture_slot("wall"));
        assert!(!is_furniture_slot("plant"));
    }
}
