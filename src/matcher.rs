//! One-to-one matching between plan elements and catalog templates.
//!
//! The matcher keeps two maps, element → template and template → element,
//! which are exact inverses of each other after every public call. An
//! assignment is only ever created by a successful [`Matcher::request_assign`]
//! (or [`Matcher::restore`] when a snapshot is replayed).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::plan::{FloorPlan, PlaceableTemplate, PlanElement};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// One side of the requested pair is already part of another assignment
    #[error("already associated: element '{element_id}' is matched to template '{template_id}'")]
    AssignmentConflict {
        element_id: String,
        template_id: String,
    },

    #[error("template '{template_id}' matches several plan elements: {}", .candidates.join(", "))]
    AmbiguousMatch {
        template_id: String,
        candidates: Vec<String>,
    },

    #[error("no unassigned plan element matches template '{template_id}'")]
    NoCandidate { template_id: String },

    #[error("plan element '{0}' does not exist")]
    UnknownElement(String),

    #[error("plan element '{element_id}' of type '{element_type}' cannot hold furniture")]
    NotPlaceable {
        element_id: String,
        element_type: String,
    },
}

/// A committed element ⟷ template pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub element_id: String,
    pub template_id: String,
}

/// Which side of an assignment to remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unassign<'a> {
    Element(&'a str),
    Template(&'a str),
}

/// Name rule when the element is named, type rule otherwise.
/// A blank name counts as no name.
fn element_matches(element: &PlanElement, template: &PlaceableTemplate) -> bool {
    match (element.effective_name(), element.name.as_deref()) {
        (Some(_), Some(name)) => name.to_lowercase() == template.name.to_lowercase(),
        _ => element.element_type == template.template_type,
    }
}

#[derive(Debug, Default, Clone)]
pub struct Matcher {
    by_element: HashMap<String, String>,
    by_template: HashMap<String, String>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unassigned furniture slots the template could be matched to, in plan order
    pub fn candidates<'p>(
        &self,
        plan: &'p FloorPlan,
        template: &PlaceableTemplate,
    ) -> Vec<&'p PlanElement> {
        plan.furniture_slots()
            .filter(|e| !self.by_element.contains_key(&e.id))
            .filter(|e| element_matches(e, template))
            .collect()
    }

    /// True when some furniture slot of the plan matches the template, assigned or not
    pub fn is_element_in_plan(plan: &FloorPlan, template: &PlaceableTemplate) -> bool {
        plan.furniture_slots().any(|e| element_matches(e, template))
    }

    /// Request an assignment for `template`.
    ///
    /// With an explicit element the pair is committed as long as neither side
    /// is taken and the element is a furniture slot. Without one, the pair is
    /// committed only when exactly one candidate exists.
    pub fn request_assign(
        &mut self,
        plan: &FloorPlan,
        template: &PlaceableTemplate,
        element_id: Option<&str>,
    ) -> Result<Assignment, MatchError> {
        if let Some(existing) = self.by_template.get(&template.id) {
            return Err(MatchError::AssignmentConflict {
                element_id: existing.clone(),
                template_id: template.id.clone(),
            });
        }

        let element_id = match element_id {
            Some(id) => {
                let element = plan
                    .element(id)
                    .ok_or_else(|| MatchError::UnknownElement(id.to_string()))?;
                if let Some(owner) = self.by_element.get(id) {
                    return Err(MatchError::AssignmentConflict {
                        element_id: id.to_string(),
                        template_id: owner.clone(),
                    });
                }
                if !element.is_furniture_slot() {
                    return Err(MatchError::NotPlaceable {
                        element_id: element.id.clone(),
                        element_type: element.element_type.clone(),
                    });
                }
                element.id.clone()
            }
            None => {
                let candidates = self.candidates(plan, template);
                match candidates.as_slice() {
                    [] => {
                        return Err(MatchError::NoCandidate {
                            template_id: template.id.clone(),
                        })
                    }
                    [only] => only.id.clone(),
                    many => {
                        return Err(MatchError::AmbiguousMatch {
                            template_id: template.id.clone(),
                            candidates: many.iter().map(|e| e.id.clone()).collect(),
                        })
                    }
                }
            }
        };

        Ok(self.commit(element_id, template.id.clone()))
    }

    fn commit(&mut self, element_id: String, template_id: String) -> Assignment {
        debug!(element = %element_id, template = %template_id, "assignment committed");
        self.by_element
            .insert(element_id.clone(), template_id.clone());
        self.by_template
            .insert(template_id.clone(), element_id.clone());
        Assignment {
            element_id,
            template_id,
        }
    }

    /// Re-commit a known pair, e.g. from a saved snapshot.
    ///
    /// Same conflict rules as an explicit request, without the candidate search.
    pub fn restore(&mut self, plan: &FloorPlan, assignment: &Assignment) -> Result<(), MatchError> {
        if self.template_for(&assignment.element_id) == Some(assignment.template_id.as_str()) {
            return Ok(());
        }
        if let Some(existing) = self.by_template.get(&assignment.template_id) {
            return Err(MatchError::AssignmentConflict {
                element_id: existing.clone(),
                template_id: assignment.template_id.clone(),
            });
        }
        if let Some(owner) = self.by_element.get(&assignment.element_id) {
            return Err(MatchError::AssignmentConflict {
                element_id: assignment.element_id.clone(),
                template_id: owner.clone(),
            });
        }
        let element = plan
            .element(&assignment.element_id)
            .ok_or_else(|| MatchError::UnknownElement(assignment.element_id.clone()))?;
        if !element.is_furniture_slot() {
            return Err(MatchError::NotPlaceable {
                element_id: element.id.clone(),
                element_type: element.element_type.clone(),
            });
        }
        self.commit(
            assignment.element_id.clone(),
            assignment.template_id.clone(),
        );
        Ok(())
    }

    /// Remove an assignment from either side. Returns the removed pair, if any.
    pub fn unassign(&mut self, target: Unassign<'_>) -> Option<Assignment> {
        let (element_id, template_id) = match target {
            Unassign::Element(id) => {
                let template_id = self.by_element.remove(id)?;
                self.by_template.remove(&template_id);
                (id.to_string(), template_id)
            }
            Unassign::Template(id) => {
                let element_id = self.by_template.remove(id)?;
                self.by_element.remove(&element_id);
                (element_id, id.to_string())
            }
        };
        debug!(element = %element_id, template = %template_id, "assignment removed");
        Some(Assignment {
            element_id,
            template_id,
        })
    }

    pub fn reset(&mut self) {
        self.by_element.clear();
        self.by_template.clear();
    }

    pub fn template_for(&self, element_id: &str) -> Option<&str> {
        self.by_element.get(element_id).map(String::as_str)
    }

    pub fn element_for(&self, template_id: &str) -> Option<&str> {
        self.by_template.get(template_id).map(String::as_str)
    }

    pub fn is_element_assigned(&self, element_id: &str) -> bool {
        self.by_element.contains_key(element_id)
    }

    pub fn is_template_assigned(&self, template_id: &str) -> bool {
        self.by_template.contains_key(template_id)
    }

    /// All assignments, sorted by element id
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut pairs: Vec<Assignment> = self
            .by_element
            .iter()
            .map(|(e, t)| Assignment {
                element_id: e.clone(),
                template_id: t.clone(),
            })
            .collect();
        pairs.sort_by(|a, b| a.element_id.cmp(&b.element_id));
        pairs
    }

    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }

    /// Furniture-slot elements whose name or type contains `term`, ignoring case.
    /// An empty term lists every slot.
    pub fn search_slots<'p>(plan: &'p FloorPlan, term: &str) -> Vec<&'p PlanElement> {
        let needle = term.trim().to_lowercase();
        plan.furniture_slots()
            .filter(|e| {
                needle.is_empty()
                    || e.element_type.to_lowercase().contains(&needle)
                    || e
                        .effective_name()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// The two maps are exact inverses
    pub fn check_invariants(&self) -> bool {
        self.by_element.len() == self.by_template.len()
            && self
                .by_element
                .iter()
                .all(|(e, t)| self.by_template.get(t) == Some(e))
    }
}
