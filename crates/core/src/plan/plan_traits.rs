use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::plan_model::PlanSnapshot;
use crate::accounts::{Account, AccountUpdate, NewAccount};
use crate::allocation::{AllocationResult, InvestmentAllocation};
use crate::errors::Result;
use crate::groups::{Group, GroupUpdate, NewGroup};
use crate::investments::{Investment, InvestmentUpdate, NewInvestment};
use crate::schedule::{CompletionCount, ScheduleEntry};

/// Storage collaborator for a single user's plan.
#[async_trait]
pub trait PlanRepositoryTrait: Send + Sync {
    /// Returns `None` when nothing has been stored yet.
    async fn load_plan(&self) -> Result<Option<PlanSnapshot>>;
    async fn save_plan(&self, snapshot: &PlanSnapshot) -> Result<()>;
}

/// Trait for plan service operations
#[async_trait]
pub trait PlanServiceTrait: Send + Sync {
    fn snapshot(&self) -> Result<PlanSnapshot>;

    fn set_exchange_rate(&self, rate: Decimal) -> Result<()>;

    fn add_account(&self, new_account: NewAccount) -> Result<Account>;
    fn update_account(&self, account_update: AccountUpdate) -> Result<Account>;
    fn remove_account(&self, account_id: &str) -> Result<()>;

    fn add_group(&self, new_group: NewGroup) -> Result<Group>;
    fn update_group(&self, group_update: GroupUpdate) -> Result<Group>;
    fn remove_group(&self, group_id: &str) -> Result<()>;

    fn add_investment(&self, new_investment: NewInvestment) -> Result<Investment>;
    fn update_investment(&self, investment_update: InvestmentUpdate) -> Result<Investment>;
    fn remove_investment(&self, investment_id: &str) -> Result<()>;
    fn move_investment(&self, investment_id: &str, new_index: usize) -> Result<()>;

    fn recompute(&self) -> Result<AllocationResult>;
    /// Allocates `candidate` against what the other investments leave after
    /// a full pass. With `replacing`, that investment's draws are released.
    fn preview_investment(
        &self,
        candidate: NewInvestment,
        replacing: Option<&str>,
    ) -> Result<InvestmentAllocation>;

    fn schedule(&self, investment_id: &str) -> Result<Vec<ScheduleEntry>>;
    fn toggle_completion(&self, investment_id: &str, date: NaiveDate) -> Result<bool>;
    fn completion_count(&self, investment_id: &str) -> Result<CompletionCount>;

    fn export_csv(&self) -> Result<String>;
    fn export_text(&self) -> Result<String>;

    async fn load(&self) -> Result<()>;
    async fn save_if_changed(&self) -> Result<bool>;
    fn apply_remote_snapshot(&self, snapshot: PlanSnapshot) -> Result<()>;
}
