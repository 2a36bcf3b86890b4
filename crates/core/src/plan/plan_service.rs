use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::plan_model::PlanSnapshot;
use super::plan_traits::{PlanRepositoryTrait, PlanServiceTrait};
use crate::accounts::{Account, AccountUpdate, NewAccount};
use crate::allocation::{self, AllocationEngine, AllocationResult, InvestmentAllocation};
use crate::errors::{Error, Result};
use crate::export::PlanExporter;
use crate::groups::{Group, GroupHierarchy, GroupUpdate, NewGroup};
use crate::investments::{Investment, InvestmentUpdate, NewInvestment};
use crate::schedule::{generate_schedule, CompletionCount, ScheduleEntry};
use crate::settings::PlannerSettings;

struct PlanState {
    snapshot: PlanSnapshot,
    /// What the repository is known to hold, `None` before the first load
    last_saved: Option<PlanSnapshot>,
}

/// Owns the current plan and validates every mutation before applying it.
///
/// Computations clone the snapshot under the read lock, so a recompute never
/// observes a half-applied mutation.
pub struct PlanService {
    repository: Arc<dyn PlanRepositoryTrait>,
    settings: PlannerSettings,
    state: RwLock<PlanState>,
}

impl PlanService {
    pub fn new(repository: Arc<dyn PlanRepositoryTrait>, settings: PlannerSettings) -> Self {
        let snapshot = PlanSnapshot::with_exchange_rate(settings.default_exchange_rate);
        PlanService {
            repository,
            settings,
            state: RwLock::new(PlanState {
                snapshot,
                last_saved: None,
            }),
        }
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, PlanState>> {
        self.state
            .read()
            .map_err(|_| Error::Unexpected("plan state lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, PlanState>> {
        self.state
            .write()
            .map_err(|_| Error::Unexpected("plan state lock poisoned".to_string()))
    }

    fn new_id(requested: Option<String>) -> String {
        requested
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    fn investment_ref<'a>(snapshot: &'a PlanSnapshot, investment_id: &str) -> Result<&'a Investment> {
        snapshot
            .investment(investment_id)
            .ok_or_else(|| Error::not_found("Investment", investment_id))
    }

    fn check_references(
        snapshot: &PlanSnapshot,
        account_priority: &[String],
        group_id: Option<&str>,
    ) -> Result<()> {
        if let Some(missing) = account_priority
            .iter()
            .find(|id| snapshot.account(id).is_none())
        {
            return Err(Error::not_found("Account", missing.as_str()));
        }
        if let Some(group_id) = group_id {
            if snapshot.group(group_id).is_none() {
                return Err(Error::not_found("Group", group_id));
            }
        }
        Ok(())
    }

    fn check_parent(groups: &[Group], parent_id: Option<&str>) -> Result<()> {
        if let Some(parent_id) = parent_id {
            if !groups.iter().any(|g| g.id == parent_id) {
                return Err(Error::not_found("Group", parent_id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PlanServiceTrait for PlanService {
    fn snapshot(&self) -> Result<PlanSnapshot> {
        Ok(self.read_state()?.snapshot.clone())
    }

    fn set_exchange_rate(&self, rate: Decimal) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(Error::InvalidExchangeRate(format!(
                "rate must be greater than zero, got {}",
                rate
            )));
        }
        self.write_state()?.snapshot.exchange_rate = rate;
        Ok(())
    }

    // ==================== Accounts ====================

    fn add_account(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate(&self.settings)?;
        let mut state = self.write_state()?;
        let id = Self::new_id(new_account.id);
        if state.snapshot.account(&id).is_some() {
            return Err(Error::ConstraintViolation(format!(
                "Account '{}' already exists",
                id
            )));
        }
        let account = Account {
            id,
            name: new_account.name.trim().to_string(),
            currency: new_account.currency,
            balance: new_account.balance,
        };
        debug!("Adding account {} ({})", account.name, account.currency);
        state.snapshot.accounts.push(account.clone());
        Ok(account)
    }

    fn update_account(&self, account_update: AccountUpdate) -> Result<Account> {
        account_update.validate(&self.settings)?;
        let mut state = self.write_state()?;
        let account = state
            .snapshot
            .accounts
            .iter_mut()
            .find(|a| a.id == account_update.id)
            .ok_or_else(|| Error::not_found("Account", account_update.id.as_str()))?;
        account_update.apply_to(account);
        Ok(account.clone())
    }

    fn remove_account(&self, account_id: &str) -> Result<()> {
        let mut state = self.write_state()?;
        let before = state.snapshot.accounts.len();
        state.snapshot.accounts.retain(|a| a.id != account_id);
        if state.snapshot.accounts.len() == before {
            return Err(Error::not_found("Account", account_id));
        }
        for investment in state.snapshot.investments.iter_mut() {
            investment.account_priority.retain(|id| id != account_id);
        }
        debug!("Removed account {} and pruned it from priority lists", account_id);
        Ok(())
    }

    // ==================== Groups ====================

    fn add_group(&self, new_group: NewGroup) -> Result<Group> {
        new_group.validate()?;
        let mut state = self.write_state()?;
        let id = Self::new_id(new_group.id);
        if state.snapshot.group(&id).is_some() {
            return Err(Error::ConstraintViolation(format!(
                "Group '{}' already exists",
                id
            )));
        }
        Self::check_parent(&state.snapshot.groups, new_group.parent_id.as_deref())?;
        let group = Group {
            id,
            name: new_group.name.trim().to_string(),
            color: new_group.color,
            percentage: new_group
                .percentage
                .unwrap_or(crate::constants::DEFAULT_GROUP_PERCENTAGE),
            parent_id: new_group.parent_id,
        };
        state.snapshot.groups.push(group.clone());
        Ok(group)
    }

    fn update_group(&self, group_update: GroupUpdate) -> Result<Group> {
        group_update.validate()?;
        let mut state = self.write_state()?;

        let mut candidate = state.snapshot.groups.clone();
        let index = candidate
            .iter()
            .position(|g| g.id == group_update.id)
            .ok_or_else(|| Error::not_found("Group", group_update.id.as_str()))?;
        group_update.apply_to(&mut candidate[index]);
        Self::check_parent(&candidate, candidate[index].parent_id.as_deref())?;
        GroupHierarchy::new(&candidate).validate()?;

        let updated = candidate[index].clone();
        state.snapshot.groups = candidate;
        Ok(updated)
    }

    fn remove_group(&self, group_id: &str) -> Result<()> {
        let mut state = self.write_state()?;
        if state.snapshot.group(group_id).is_none() {
            return Err(Error::not_found("Group", group_id));
        }
        if GroupHierarchy::new(&state.snapshot.groups).has_children(group_id) {
            return Err(Error::ConstraintViolation(format!(
                "Group '{}' still has child groups",
                group_id
            )));
        }
        if state
            .snapshot
            .investments
            .iter()
            .any(|i| i.group_id.as_deref() == Some(group_id))
        {
            return Err(Error::ConstraintViolation(format!(
                "Group '{}' still has investments",
                group_id
            )));
        }
        state.snapshot.groups.retain(|g| g.id != group_id);
        Ok(())
    }

    // ==================== Investments ====================

    fn add_investment(&self, new_investment: NewInvestment) -> Result<Investment> {
        new_investment.validate()?;
        let mut state = self.write_state()?;
        let id = Self::new_id(new_investment.id.clone());
        if state.snapshot.investment(&id).is_some() {
            return Err(Error::ConstraintViolation(format!(
                "Investment '{}' already exists",
                id
            )));
        }
        Self::check_references(
            &state.snapshot,
            &new_investment.account_priority,
            new_investment.group_id.as_deref(),
        )?;
        let investment = new_investment.into_investment(id);
        debug!(
            "Adding investment {} claiming {}%",
            investment.name, investment.percentage
        );
        state.snapshot.investments.push(investment.clone());
        Ok(investment)
    }

    fn update_investment(&self, investment_update: InvestmentUpdate) -> Result<Investment> {
        investment_update.validate()?;
        let mut state = self.write_state()?;
        let mut updated = Self::investment_ref(&state.snapshot, &investment_update.id)?.clone();
        investment_update.apply_to(&mut updated);
        Self::check_references(
            &state.snapshot,
            &updated.account_priority,
            updated.group_id.as_deref(),
        )?;
        if let Some(slot) = state
            .snapshot
            .investments
            .iter_mut()
            .find(|i| i.id == updated.id)
        {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    fn remove_investment(&self, investment_id: &str) -> Result<()> {
        let mut state = self.write_state()?;
        let before = state.snapshot.investments.len();
        state.snapshot.investments.retain(|i| i.id != investment_id);
        if state.snapshot.investments.len() == before {
            return Err(Error::not_found("Investment", investment_id));
        }
        Ok(())
    }

    fn move_investment(&self, investment_id: &str, new_index: usize) -> Result<()> {
        let mut state = self.write_state()?;
        let investments = &mut state.snapshot.investments;
        let current = investments
            .iter()
            .position(|i| i.id == investment_id)
            .ok_or_else(|| Error::not_found("Investment", investment_id))?;
        if new_index >= investments.len() {
            return Err(Error::invalid_input(format!(
                "Position {} is out of range for {} investments",
                new_index,
                investments.len()
            )));
        }
        let investment = investments.remove(current);
        investments.insert(new_index, investment);
        Ok(())
    }

    // ==================== Derived Values ====================

    fn recompute(&self) -> Result<AllocationResult> {
        let snapshot = self.snapshot()?;
        allocation::recompute(&snapshot, &self.settings)
    }

    fn preview_investment(
        &self,
        candidate: NewInvestment,
        replacing: Option<&str>,
    ) -> Result<InvestmentAllocation> {
        candidate.validate()?;
        let snapshot = self.snapshot()?;
        if let Some(id) = replacing {
            Self::investment_ref(&snapshot, id)?;
        }
        Self::check_references(
            &snapshot,
            &candidate.account_priority,
            candidate.group_id.as_deref(),
        )?;

        // Balances left by every other investment in the current plan. The
        // edited investment's own draws go back to their accounts; nothing
        // else is re-allocated.
        let engine = AllocationEngine::new(&snapshot, &self.settings)?;
        let current = engine.run()?;
        let mut remaining = current.remaining_balances.clone();
        if let Some(previous) = replacing.and_then(|id| current.get(id)) {
            for draw in &previous.draws {
                *remaining
                    .entry(draw.account_id.clone())
                    .or_insert(Decimal::ZERO) += draw.amount;
            }
        }

        let id = replacing
            .map(str::to_string)
            .or_else(|| candidate.id.clone())
            .unwrap_or_else(|| "preview".to_string());
        engine.allocate(&candidate.into_investment(id), &mut remaining)
    }

    fn schedule(&self, investment_id: &str) -> Result<Vec<ScheduleEntry>> {
        let state = self.read_state()?;
        let investment = Self::investment_ref(&state.snapshot, investment_id)?;
        Ok(generate_schedule(
            &investment.recurrence,
            &investment.history,
            self.settings.max_schedule_iterations,
        ))
    }

    fn toggle_completion(&self, investment_id: &str, date: NaiveDate) -> Result<bool> {
        let mut state = self.write_state()?;
        let investment = state
            .snapshot
            .investments
            .iter_mut()
            .find(|i| i.id == investment_id)
            .ok_or_else(|| Error::not_found("Investment", investment_id))?;
        let completed = investment.history.toggle(date);
        debug!(
            "Contribution {} for {} marked {}",
            date,
            investment.name,
            if completed { "completed" } else { "outstanding" }
        );
        Ok(completed)
    }

    fn completion_count(&self, investment_id: &str) -> Result<CompletionCount> {
        Ok(CompletionCount::from_schedule(&self.schedule(investment_id)?))
    }

    fn export_csv(&self) -> Result<String> {
        let snapshot = self.snapshot()?;
        let result = allocation::recompute(&snapshot, &self.settings)?;
        PlanExporter::new(&snapshot, &result, &self.settings).to_csv()
    }

    fn export_text(&self) -> Result<String> {
        let snapshot = self.snapshot()?;
        let result = allocation::recompute(&snapshot, &self.settings)?;
        PlanExporter::new(&snapshot, &result, &self.settings).to_text()
    }

    // ==================== Persistence ====================

    async fn load(&self) -> Result<()> {
        let loaded = self.repository.load_plan().await?;
        let snapshot = match loaded {
            Some(snapshot) => {
                debug!(
                    "Loaded plan with {} accounts and {} investments",
                    snapshot.accounts.len(),
                    snapshot.investments.len()
                );
                snapshot
            }
            None => {
                debug!("No stored plan, starting fresh");
                PlanSnapshot::with_exchange_rate(self.settings.default_exchange_rate)
            }
        };
        let mut state = self.write_state()?;
        state.last_saved = Some(snapshot.clone());
        state.snapshot = snapshot;
        Ok(())
    }

    async fn save_if_changed(&self) -> Result<bool> {
        let (pending, saved_before) = {
            let state = self.read_state()?;
            if state.last_saved.as_ref() == Some(&state.snapshot) {
                debug!("No changes detected, skipping save");
                return Ok(false);
            }
            (state.snapshot.clone(), state.last_saved.clone())
        };

        if let Err(e) = self.repository.save_plan(&pending).await {
            warn!("Failed to save plan: {}", e);
            return Err(e);
        }

        // A remote snapshot applied during the save already moved the marker.
        let mut state = self.write_state()?;
        if state.last_saved == saved_before {
            state.last_saved = Some(pending);
        } else {
            debug!("Plan was replaced while saving, keeping the newer saved state");
        }
        Ok(true)
    }

    fn apply_remote_snapshot(&self, snapshot: PlanSnapshot) -> Result<()> {
        debug!("Applying plan update from another session");
        let mut state = self.write_state()?;
        state.last_saved = Some(snapshot.clone());
        state.snapshot = snapshot;
        Ok(())
    }
}
