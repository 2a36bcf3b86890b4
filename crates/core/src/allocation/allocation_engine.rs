//! Waterfall allocation of investments across prioritized accounts.

use std::collections::HashMap;

use log::{debug, warn};
use rust_decimal::Decimal;

use super::allocation_model::{AccountDraw, AllocationResult, InvestmentAllocation};
use crate::accounts::Account;
use crate::errors::{Error, Result};
use crate::fx::CurrencyConverter;
use crate::groups::GroupHierarchy;
use crate::investments::Investment;
use crate::plan::PlanSnapshot;
use crate::settings::PlannerSettings;

/// One allocation pass over a borrowed, unchanging snapshot.
///
/// Balances are drained through a `remaining` map owned by the caller of
/// [`AllocationEngine::allocate`], so no state outlives a pass.
pub struct AllocationEngine<'a> {
    converter: CurrencyConverter,
    accounts: HashMap<&'a str, &'a Account>,
    hierarchy: GroupHierarchy<'a>,
    snapshot: &'a PlanSnapshot,
    tolerance: Decimal,
    total_funds: Decimal,
}

impl<'a> AllocationEngine<'a> {
    /// Prepares a pass. Fails on a non-positive exchange rate, a cyclic
    /// group hierarchy or balances too large to total.
    pub fn new(snapshot: &'a PlanSnapshot, settings: &PlannerSettings) -> Result<Self> {
        let converter = CurrencyConverter::new(&settings.base_currency, snapshot.exchange_rate)?;
        let hierarchy = GroupHierarchy::new(&snapshot.groups);
        hierarchy.validate()?;

        let accounts: HashMap<&str, &Account> = snapshot
            .accounts
            .iter()
            .map(|a| (a.id.as_str(), a))
            .collect();

        let mut total_funds = Decimal::ZERO;
        for account in &snapshot.accounts {
            let base = converter.checked_to_base(account.effective_balance(), &account.currency)?;
            total_funds = total_funds
                .checked_add(base)
                .ok_or_else(|| Error::invalid_input("Total funds exceed the supported range"))?;
        }

        Ok(Self {
            converter,
            accounts,
            hierarchy,
            snapshot,
            tolerance: settings.allocation_tolerance,
            total_funds,
        })
    }

    pub fn total_funds(&self) -> Decimal {
        self.total_funds
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    pub fn hierarchy(&self) -> &GroupHierarchy<'a> {
        &self.hierarchy
    }

    /// Starting balances, native currency, keyed by account id.
    pub fn opening_balances(&self) -> HashMap<String, Decimal> {
        self.snapshot
            .accounts
            .iter()
            .map(|a| (a.id.clone(), a.effective_balance()))
            .collect()
    }

    /// Allocates every investment in list order and reports what is left.
    pub fn run(&self) -> Result<AllocationResult> {
        let mut remaining = self.opening_balances();
        let mut investments = Vec::with_capacity(self.snapshot.investments.len());

        for investment in &self.snapshot.investments {
            let allocation = self.allocate(investment, &mut remaining)?;
            if allocation.is_overspent() {
                debug!(
                    "Investment '{}' is short {} {}",
                    investment.name,
                    allocation.unfunded_base().round_dp(2),
                    self.converter.base_currency()
                );
            }
            investments.push(allocation);
        }

        Ok(AllocationResult {
            total_funds: self.total_funds,
            investments,
            remaining_balances: remaining,
        })
    }

    /// Drains `remaining` for a single investment, first-listed account first.
    pub fn allocate(
        &self,
        investment: &Investment,
        remaining: &mut HashMap<String, Decimal>,
    ) -> Result<InvestmentAllocation> {
        let percentage = investment.percentage;
        if percentage <= Decimal::ZERO {
            return Ok(InvestmentAllocation::empty(&investment.id, true));
        }

        let scope_base = self
            .hierarchy
            .fund_amount(investment.group_id.as_deref(), self.total_funds)?;
        if scope_base <= Decimal::ZERO {
            return Ok(InvestmentAllocation::empty(
                &investment.id,
                percentage.is_zero(),
            ));
        }

        let needed_base = (percentage / Decimal::ONE_HUNDRED)
            .checked_mul(scope_base)
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "Investment '{}' claims more than can be represented",
                    investment.name
                ))
            })?;
        let mut outstanding = needed_base;
        let mut draws: Vec<AccountDraw> = Vec::new();

        for account_id in &investment.account_priority {
            if outstanding < self.tolerance {
                break;
            }

            let Some(account) = self.accounts.get(account_id.as_str()) else {
                warn!(
                    "Investment '{}' lists unknown account '{}', skipping",
                    investment.name, account_id
                );
                continue;
            };

            let available = remaining
                .get(account_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if available <= Decimal::ZERO {
                continue;
            }

            let available_base = self.converter.to_base(available, &account.currency);
            // Draining the whole balance takes the native amount as is.
            let (take_base, take_native) = if outstanding >= available_base {
                (available_base, available)
            } else {
                (
                    outstanding,
                    self.converter
                        .from_base(outstanding, &account.currency)
                        .min(available),
                )
            };
            if take_native <= Decimal::ZERO {
                continue;
            }

            match draws.iter_mut().find(|d| d.account_id == *account_id) {
                Some(draw) => draw.amount += take_native,
                None => draws.push(AccountDraw {
                    account_id: account_id.clone(),
                    amount: take_native,
                }),
            }
            remaining.insert(account_id.clone(), available - take_native);
            outstanding -= take_base;
        }

        Ok(InvestmentAllocation {
            investment_id: investment.id.clone(),
            draws,
            needed_base,
            allocated_base: needed_base - outstanding,
            fully_allocated: outstanding < self.tolerance,
        })
    }
}

/// Recomputes the full allocation table from scratch.
pub fn recompute(snapshot: &PlanSnapshot, settings: &PlannerSettings) -> Result<AllocationResult> {
    let engine = AllocationEngine::new(snapshot, settings)?;
    debug!(
        "Recomputing allocations: {} accounts, {} investments, total {} {}",
        snapshot.accounts.len(),
        snapshot.investments.len(),
        engine.total_funds().round_dp(2),
        settings.base_currency
    );
    engine.run()
}
