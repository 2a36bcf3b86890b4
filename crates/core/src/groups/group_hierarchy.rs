//! Resolves how much of the total funds a group governs.

use std::collections::{HashMap, HashSet};

use log::warn;
use rust_decimal::Decimal;

use super::groups_model::Group;
use crate::errors::{Error, Result};

/// Read-only index over a group forest.
pub struct GroupHierarchy<'a> {
    groups: &'a [Group],
    by_id: HashMap<&'a str, &'a Group>,
}

impl<'a> GroupHierarchy<'a> {
    pub fn new(groups: &'a [Group]) -> Self {
        let by_id = groups.iter().map(|g| (g.id.as_str(), g)).collect();
        Self { groups, by_id }
    }

    pub fn get(&self, group_id: &str) -> Option<&'a Group> {
        self.by_id.get(group_id).copied()
    }

    /// Cumulative fraction (0..=1 for valid percentages) of the total funds
    /// the group scopes. Ungrouped (`None`) is the full scope.
    ///
    /// Walks from the group to its root multiplying `percentage / 100`.
    /// An unknown id ends the walk where it is found; a revisited id is a
    /// cycle and is reported instead of looping.
    pub fn scoped_fraction(&self, group_id: Option<&str>) -> Result<Decimal> {
        let mut fraction = Decimal::ONE;
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = group_id;

        while let Some(id) = current {
            let Some(group) = self.get(id) else {
                warn!("Group '{}' not found, truncating hierarchy walk", id);
                break;
            };
            if !visited.insert(group.id.as_str()) {
                return Err(Error::GroupCycle(group.id.clone()));
            }
            fraction = fraction
                .checked_mul(group.percentage.max(Decimal::ZERO) / Decimal::ONE_HUNDRED)
                .ok_or_else(|| Error::invalid_input(format!("Group '{}' scopes too much", group.id)))?;
            current = group.parent_id.as_deref();
        }

        Ok(fraction)
    }

    /// Base-currency amount the group governs out of `total_funds`.
    pub fn fund_amount(&self, group_id: Option<&str>, total_funds: Decimal) -> Result<Decimal> {
        self.scoped_fraction(group_id)?
            .checked_mul(total_funds)
            .ok_or_else(|| Error::invalid_input("Group scope exceeds the supported range"))
    }

    /// Ancestor chain of a group, root first, ending with the group itself.
    pub fn path(&self, group_id: &str) -> Result<Vec<&'a Group>> {
        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(group_id);

        while let Some(id) = current {
            let Some(group) = self.get(id) else {
                break;
            };
            if !visited.insert(group.id.as_str()) {
                return Err(Error::GroupCycle(group.id.clone()));
            }
            chain.push(group);
            current = group.parent_id.as_deref();
        }

        chain.reverse();
        Ok(chain)
    }

    /// Checks every group for a parent cycle.
    pub fn validate(&self) -> Result<()> {
        for group in self.groups {
            self.scoped_fraction(Some(&group.id))?;
        }
        Ok(())
    }

    /// Top-level groups: no parent, or a parent that no longer exists.
    pub fn roots(&self) -> Vec<&'a Group> {
        self.groups
            .iter()
            .filter(|g| match g.parent_id.as_deref() {
                None => true,
                Some(parent) => !self.by_id.contains_key(parent),
            })
            .collect()
    }

    /// Direct children of a group, in list order.
    pub fn children(&self, parent_id: &str) -> Vec<&'a Group> {
        self.groups
            .iter()
            .filter(|g| g.parent_id.as_deref() == Some(parent_id))
            .collect()
    }

    pub fn has_children(&self, group_id: &str) -> bool {
        self.groups
            .iter()
            .any(|g| g.parent_id.as_deref() == Some(group_id))
    }
}
