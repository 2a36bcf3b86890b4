//! Investment domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::groups::validate_percentage;
use crate::schedule::{CompletionLedger, Recurrence};
use crate::utils::serde_utils::{lenient_decimal, lenient_id, lenient_id_list, lenient_optional_id};

/// A funding target claiming a percentage of its group's scoped amount
/// (or of all funds when ungrouped).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub percentage: Decimal,
    /// Accounts to draw from, first listed is drained first
    #[serde(default, deserialize_with = "lenient_id_list")]
    pub account_priority: Vec<String>,
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub group_id: Option<String>,
    #[serde(flatten)]
    pub recurrence: Recurrence,
    #[serde(default, alias = "dcaHistory")]
    pub history: CompletionLedger,
}

/// Input model for creating a new investment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestment {
    pub id: Option<String>,
    pub name: String,
    pub percentage: Decimal,
    pub account_priority: Vec<String>,
    pub group_id: Option<String>,
    pub recurrence: Recurrence,
}

impl NewInvestment {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_percentage(self.percentage)?;
        self.recurrence.validate()
    }

    /// Builds the investment with an empty completion history.
    pub fn into_investment(self, id: String) -> Investment {
        Investment {
            id,
            name: self.name.trim().to_string(),
            percentage: self.percentage,
            account_priority: self.account_priority,
            group_id: self.group_id,
            recurrence: self.recurrence,
            history: CompletionLedger::new(),
        }
    }
}

/// Input model for updating an investment. The completion history is
/// never replaced through an update.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentUpdate {
    pub id: String,
    pub name: Option<String>,
    pub percentage: Option<Decimal>,
    pub account_priority: Option<Vec<String>>,
    pub group_id: Option<Option<String>>,
    pub recurrence: Option<Recurrence>,
}

impl InvestmentUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(percentage) = self.percentage {
            validate_percentage(percentage)?;
        }
        if let Some(recurrence) = &self.recurrence {
            recurrence.validate()?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(&self, investment: &mut Investment) {
        if let Some(name) = &self.name {
            investment.name = name.trim().to_string();
        }
        if let Some(percentage) = self.percentage {
            investment.percentage = percentage;
        }
        if let Some(priority) = &self.account_priority {
            investment.account_priority = priority.clone();
        }
        if let Some(group_id) = &self.group_id {
            investment.group_id = group_id.clone();
        }
        if let Some(recurrence) = &self.recurrence {
            investment.recurrence = recurrence.clone();
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "Investment name cannot be empty".to_string(),
        )));
    }
    Ok(())
}
