//! Account domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::settings::PlannerSettings;
use crate::utils::serde_utils::{lenient_decimal, lenient_id};

/// An independent pool of funds held in one currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub name: String,
    pub currency: String,
    /// Balance in the account's own currency
    #[serde(default, alias = "amount", deserialize_with = "lenient_decimal")]
    pub balance: Decimal,
}

impl Account {
    /// Balance used by the allocation engine; negative balances count as zero.
    pub fn effective_balance(&self) -> Decimal {
        self.balance.max(Decimal::ZERO)
    }
}

/// Input model for creating a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub currency: String,
    pub balance: Decimal,
}

impl NewAccount {
    /// Validates the new account data.
    pub fn validate(&self, settings: &PlannerSettings) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account name cannot be empty".to_string(),
            )));
        }
        validate_currency(&self.currency, settings)?;
        validate_balance(self.balance)
    }
}

/// Input model for updating an existing account. `None` keeps the current value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub balance: Option<Decimal>,
}

impl AccountUpdate {
    /// Validates the account update data.
    pub fn validate(&self, settings: &PlannerSettings) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "id".to_string(),
            )));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Account name cannot be empty".to_string(),
                )));
            }
        }
        if let Some(currency) = &self.currency {
            validate_currency(currency, settings)?;
        }
        if let Some(balance) = self.balance {
            validate_balance(balance)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(&self, account: &mut Account) {
        if let Some(name) = &self.name {
            account.name = name.trim().to_string();
        }
        if let Some(currency) = &self.currency {
            account.currency = currency.clone();
        }
        if let Some(balance) = self.balance {
            account.balance = balance;
        }
    }
}

fn validate_currency(currency: &str, settings: &PlannerSettings) -> Result<()> {
    if !settings.is_supported_currency(currency) {
        return Err(Error::UnsupportedCurrency(currency.to_string()));
    }
    Ok(())
}

fn validate_balance(balance: Decimal) -> Result<()> {
    if balance < Decimal::ZERO {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Account balance cannot be negative, got {}",
            balance
        ))));
    }
    Ok(())
}
