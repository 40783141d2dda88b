//! In-memory store of saved floor plans

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::PlanError;
use super::model::FloorPlan;

/// Saved plans keyed by id, plus the id of the plan currently open
#[derive(Debug, Default, Clone)]
pub struct PlanLibrary {
    plans: BTreeMap<String, FloorPlan>,
    active: Option<String>,
}

impl PlanLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a plan stamped with the current time
    pub fn save(&mut self, plan: FloorPlan) -> Result<&FloorPlan, PlanError> {
        self.save_at(plan, Utc::now())
    }

    /// Save a plan, creating or replacing it.
    ///
    /// A new plan gets `created_at` set; every save refreshes `updated_at`.
    /// A replaced plan keeps its original creation time.
    pub fn save_at(&mut self, mut plan: FloorPlan, now: DateTime<Utc>) -> Result<&FloorPlan, PlanError> {
        plan.validate()?;

        let created_at = self
            .plans
            .get(&plan.id)
            .and_then(|existing| existing.created_at)
            .or(plan.created_at)
            .unwrap_or(now);
        plan.created_at = Some(created_at);
        plan.updated_at = Some(now);

        debug!(plan = %plan.id, elements = plan.elements.len(), "saved plan");

        let id = plan.id.clone();
        self.plans.insert(id.clone(), plan);
        self.plans
            .get(&id)
            .ok_or(PlanError::UnknownPlan { id })
    }

    pub fn get(&self, id: &str) -> Option<&FloorPlan> {
        self.plans.get(id)
    }

    /// Plans, most recently updated first
    pub fn list(&self) -> Vec<&FloorPlan> {
        let mut plans: Vec<&FloorPlan> = self.plans.values().collect();
        plans.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        plans
    }

    /// Delete a plan. Deleting the active plan clears the active id.
    pub fn delete(&mut self, id: &str) -> Result<FloorPlan, PlanError> {
        let plan = self
            .plans
            .remove(id)
            .ok_or_else(|| PlanError::UnknownPlan { id: id.to_string() })?;
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        Ok(plan)
    }

    pub fn set_active(&mut self, id: &str) -> Result<&FloorPlan, PlanError> {
        let plan = self
            .plans
            .get(id)
            .ok_or_else(|| PlanError::UnknownPlan { id: id.to_string() })?;
        self.active = Some(id.to_string());
        Ok(plan)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&FloorPlan> {
        self.active.as_deref().and_then(|id| self.plans.get(id))
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn test_save_stamps_timestamps() {
        let mut library = PlanLibrary::new();
        let saved = library.save_at(FloorPlan::new("p1", "Ground"), at(100)).unwrap();
        assert_eq!(saved.created_at, Some(at(100)));
        assert_eq!(saved.updated_at, Some(at(100)));

        let saved = library.save_at(FloorPlan::new("p1", "Ground v2"), at(200)).unwrap();
        assert_eq!(saved.name, "Ground v2");
        assert_eq!(saved.created_at, Some(at(100)));
        assert_eq!(saved.updated_at, Some(at(200)));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_list_most_recent_first() {
        let mut library = PlanLibrary::new();
        library.save_at(FloorPlan::new("a", "A"), at(10)).unwrap();
        library.save_at(FloorPlan::new("b", "B"), at(30)).unwrap();
        library.save_at(FloorPlan::new("c", "C"), at(20)).unwrap();
        let ids: Vec<&str> = library.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_delete_active_clears_active() {
        let mut library = PlanLibrary::new();
        library.save_at(FloorPlan::new("a", "A"), at(10)).unwrap();
        library.set_active("a").unwrap();
        assert_eq!(library.active_id(), Some("a"));

        library.delete("a").unwrap();
        assert_eq!(library.active_id(), None);
        assert!(matches!(library.delete("a"), Err(PlanError::UnknownPlan { .. })));
    }

    #[test]
    fn test_set_active_unknown() {
        let mut library = PlanLibrary::new();
        assert!(library.set_active("missing").is_err());
        assert!(library.active().is_none());
    }
}
