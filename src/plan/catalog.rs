//! Catalog of placeable furniture templates

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::PlanError;
use crate::geometry::Dimensions;

/// Id of the cashier template every catalog carries
pub const FIXED_CASHIER_ID: &str = "fixed-cashier";

/// A piece of furniture that can be placed in the scene. Sizes are in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceableTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub template_type: String,
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl PlaceableTemplate {
    pub fn new(
        id: impl Into<String>,
        template_type: impl Into<String>,
        name: impl Into<String>,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            id: id.into(),
            template_type: template_type.into(),
            name: name.into(),
            width: dimensions.width,
            height: dimensions.height,
            depth: dimensions.depth,
        }
    }

    /// The cashier desk that is always available
    pub fn fixed_cashier() -> Self {
        Self::new(
            FIXED_CASHIER_ID,
            "cashier",
            "Caisse",
            Dimensions::new(1.2, 1.0, 0.8),
        )
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height, self.depth)
    }
}

/// Read-only registry of templates, iterated in registration order
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: HashMap<String, PlaceableTemplate>,
    order: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create a catalog holding only the fixed cashier
    pub fn new() -> Self {
        let cashier = PlaceableTemplate::fixed_cashier();
        let mut templates = HashMap::new();
        let order = vec![cashier.id.clone()];
        templates.insert(cashier.id.clone(), cashier);
        Self { templates, order }
    }

    /// Register a template. Ids are unique and sizes must be positive.
    pub fn register(&mut self, template: PlaceableTemplate) -> Result<(), PlanError> {
        if self.templates.contains_key(&template.id) {
            return Err(PlanError::DuplicateTemplate { id: template.id });
        }
        if !template.dimensions().is_positive() {
            return Err(PlanError::invalid_template(
                &template.id,
                "width, height and depth must be positive",
            ));
        }
        self.order.push(template.id.clone());
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    /// Parse a JSON array of templates. The fixed cashier is added when the
    /// document does not carry it.
    pub fn from_json_str(content: &str) -> Result<Self, PlanError> {
        let entries: Vec<PlaceableTemplate> = serde_json::from_str(content)?;
        let mut catalog = Self::new();
        for template in entries {
            if template.id == FIXED_CASHIER_ID {
                continue;
            }
            catalog.register(template)?;
        }
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, id: &str) -> Option<&PlaceableTemplate> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceableTemplate> {
        self.order.iter().filter_map(|id| self.templates.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
