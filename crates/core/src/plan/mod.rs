//! Plan module - the snapshot, its owning service and the storage trait.

mod plan_model;
mod plan_service;
mod plan_traits;

#[cfg(test)]
mod plan_service_tests;

pub use plan_model::PlanSnapshot;
pub use plan_service::PlanService;
pub use plan_traits::{PlanRepositoryTrait, PlanServiceTrait};
