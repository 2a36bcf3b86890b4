//! Export module - read-only projections of a computed plan.

mod plan_export;

pub use plan_export::PlanExporter;
