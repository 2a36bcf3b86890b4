//! The plan snapshot: every entity the engine reads in one pass.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::Account;
use crate::constants::DEFAULT_EXCHANGE_RATE;
use crate::groups::Group;
use crate::investments::Investment;

fn default_exchange_rate() -> Decimal {
    DEFAULT_EXCHANGE_RATE
}

/// Accounts, groups and investments plus the exchange rate, as persisted.
///
/// Investment order is significant: it is the order in which investments
/// claim shared account balances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: Decimal,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub investments: Vec<Investment>,
}

impl Default for PlanSnapshot {
    fn default() -> Self {
        Self {
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            accounts: Vec::new(),
            groups: Vec::new(),
            investments: Vec::new(),
        }
    }
}

impl PlanSnapshot {
    pub fn with_exchange_rate(exchange_rate: Decimal) -> Self {
        Self {
            exchange_rate,
            ..Self::default()
        }
    }

    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == account_id)
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn investment(&self, investment_id: &str) -> Option<&Investment> {
        self.investments.iter().find(|i| i.id == investment_id)
    }
}
