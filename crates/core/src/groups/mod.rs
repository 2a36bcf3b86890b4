//! Groups module - budget group models and the hierarchy resolver.

mod group_hierarchy;
mod groups_model;

pub use group_hierarchy::GroupHierarchy;
pub use groups_model::{Group, GroupUpdate, NewGroup};
pub(crate) use groups_model::validate_percentage;
