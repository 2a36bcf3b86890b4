//! Budget group domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GROUP_PERCENTAGE;
use crate::errors::{Error, Result, ValidationError};
use crate::utils::serde_utils::{lenient_decimal, lenient_id, lenient_optional_id};

fn default_group_percentage() -> Decimal {
    DEFAULT_GROUP_PERCENTAGE
}

/// A node in the budget forest. Its percentage applies to the amount its
/// parent already scopes, so multipliers compose from root to leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub name: String,
    /// Display color, opaque to the engine
    #[serde(default)]
    pub color: String,
    #[serde(
        default = "default_group_percentage",
        deserialize_with = "lenient_decimal"
    )]
    pub percentage: Decimal,
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub parent_id: Option<String>,
}

/// Input model for creating a new group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub id: Option<String>,
    pub name: String,
    pub color: String,
    pub percentage: Option<Decimal>,
    pub parent_id: Option<String>,
}

impl NewGroup {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if let Some(percentage) = self.percentage {
            validate_percentage(percentage)?;
        }
        Ok(())
    }
}

/// Input model for updating a group. `parent_id: Some(None)` detaches it to a root.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupUpdate {
    pub id: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub percentage: Option<Decimal>,
    pub parent_id: Option<Option<String>>,
}

impl GroupUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(percentage) = self.percentage {
            validate_percentage(percentage)?;
        }
        if let Some(Some(parent_id)) = &self.parent_id {
            if *parent_id == self.id {
                return Err(Error::GroupCycle(self.id.clone()));
            }
        }
        Ok(())
    }

    pub(crate) fn apply_to(&self, group: &mut Group) {
        if let Some(name) = &self.name {
            group.name = name.trim().to_string();
        }
        if let Some(color) = &self.color {
            group.color = color.clone();
        }
        if let Some(percentage) = self.percentage {
            group.percentage = percentage;
        }
        if let Some(parent_id) = &self.parent_id {
            group.parent_id = parent_id.clone();
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "Group name cannot be empty".to_string(),
        )));
    }
    Ok(())
}

pub(crate) fn validate_percentage(percentage: Decimal) -> Result<()> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Percentage must be between 0 and 100, got {}",
            percentage
        ))));
    }
    Ok(())
}
