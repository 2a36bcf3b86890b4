//! Derived allocation results.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Amount taken from one account, in that account's currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraw {
    pub account_id: String,
    pub amount: Decimal,
}

/// Cost breakdown of one investment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentAllocation {
    pub investment_id: String,
    /// Draws in the order the accounts were drained
    pub draws: Vec<AccountDraw>,
    /// Requirement in base currency
    pub needed_base: Decimal,
    /// Amount actually sourced, in base currency
    pub allocated_base: Decimal,
    pub fully_allocated: bool,
}

impl InvestmentAllocation {
    pub(crate) fn empty(investment_id: &str, fully_allocated: bool) -> Self {
        Self {
            investment_id: investment_id.to_string(),
            draws: Vec::new(),
            needed_base: Decimal::ZERO,
            allocated_base: Decimal::ZERO,
            fully_allocated,
        }
    }

    /// Drawn amount for an account, zero when the account was not touched.
    pub fn amount_for(&self, account_id: &str) -> Decimal {
        self.draws
            .iter()
            .filter(|draw| draw.account_id == account_id)
            .map(|draw| draw.amount)
            .sum()
    }

    pub fn unfunded_base(&self) -> Decimal {
        (self.needed_base - self.allocated_base).max(Decimal::ZERO)
    }

    pub fn is_overspent(&self) -> bool {
        !self.fully_allocated
    }

    pub fn costs(&self) -> HashMap<String, Decimal> {
        let mut costs = HashMap::new();
        for draw in &self.draws {
            *costs.entry(draw.account_id.clone()).or_insert(Decimal::ZERO) += draw.amount;
        }
        costs
    }
}

/// Output of one full recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    /// Sum of all account balances, in base currency
    pub total_funds: Decimal,
    /// Per-investment breakdowns, in investment list order
    pub investments: Vec<InvestmentAllocation>,
    /// Native balance left in each account after every investment
    pub remaining_balances: HashMap<String, Decimal>,
}

impl AllocationResult {
    pub fn get(&self, investment_id: &str) -> Option<&InvestmentAllocation> {
        self.investments
            .iter()
            .find(|allocation| allocation.investment_id == investment_id)
    }

    /// investment id -> account id -> native amount drawn.
    pub fn costs(&self) -> HashMap<String, HashMap<String, Decimal>> {
        self.investments
            .iter()
            .map(|allocation| (allocation.investment_id.clone(), allocation.costs()))
            .collect()
    }

    pub fn fully_allocated_map(&self) -> HashMap<String, bool> {
        self.investments
            .iter()
            .map(|allocation| (allocation.investment_id.clone(), allocation.fully_allocated))
            .collect()
    }

    /// Unknown investments are never reported as overspent.
    pub fn is_overspent(&self, investment_id: &str) -> bool {
        self.get(investment_id)
            .map(InvestmentAllocation::is_overspent)
            .unwrap_or(false)
    }

    pub fn total_cost_base(&self, investment_id: &str) -> Decimal {
        self.get(investment_id)
            .map(|allocation| allocation.allocated_base)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn allocated_base_total(&self) -> Decimal {
        self.investments
            .iter()
            .map(|allocation| allocation.allocated_base)
            .sum()
    }

    pub fn remaining_balance(&self, account_id: &str) -> Option<Decimal> {
        self.remaining_balances.get(account_id).copied()
    }
}
