//! Floor plans, the template catalog and the plan library

pub mod catalog;
pub mod error;
pub mod library;
pub mod model;

pub use catalog::{Catalog, PlaceableTemplate, FIXED_CASHIER_ID};
pub use error::PlanError;
pub use library::PlanLibrary;
pub use model::{
    is_furniture_slot, structural_kind, FloorPlan, PlanElement, FURNITURE_ELEMENT_TYPES,
};
