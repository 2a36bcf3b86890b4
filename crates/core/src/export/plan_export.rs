use std::fmt::Write as _;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::accounts::Account;
use crate::allocation::AllocationResult;
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::{Error, Result};
use crate::fx::CurrencyConverter;
use crate::groups::{Group, GroupHierarchy};
use crate::investments::Investment;
use crate::plan::PlanSnapshot;
use crate::schedule::{generate_schedule, CompletionCount};
use crate::settings::PlannerSettings;

#[derive(Debug, Serialize)]
struct ExportRow {
    kind: &'static str,
    id: String,
    name: String,
    group: Option<String>,
    currency: String,
    amount: Option<String>,
    base_amount: String,
    remaining: Option<String>,
    percentage: Option<String>,
    per_period: Option<String>,
    per_period_native: Option<String>,
    progress: Option<String>,
    status: Option<&'static str>,
}

/// Figures shared by both export formats for one investment.
struct InvestmentFigures {
    cost_base: Decimal,
    per_period: Option<Decimal>,
    /// Each drawn account's share of one period, in that account's currency
    per_period_native: Vec<String>,
    progress: CompletionCount,
    overspent: bool,
}

/// Renders a snapshot together with its allocation result.
pub struct PlanExporter<'a> {
    snapshot: &'a PlanSnapshot,
    result: &'a AllocationResult,
    settings: &'a PlannerSettings,
}

impl<'a> PlanExporter<'a> {
    pub fn new(
        snapshot: &'a PlanSnapshot,
        result: &'a AllocationResult,
        settings: &'a PlannerSettings,
    ) -> Self {
        Self {
            snapshot,
            result,
            settings,
        }
    }

    fn converter(&self) -> Result<CurrencyConverter> {
        CurrencyConverter::new(self.settings.base_currency.clone(), self.snapshot.exchange_rate)
    }

    fn remaining(&self, account: &Account) -> Decimal {
        self.result
            .remaining_balance(&account.id)
            .unwrap_or_else(|| account.effective_balance())
    }

    fn figures(&self, investment: &Investment) -> InvestmentFigures {
        let schedule = generate_schedule(
            &investment.recurrence,
            &investment.history,
            self.settings.max_schedule_iterations,
        );
        let cost_base = self.result.total_cost_base(&investment.id);
        let mut per_period = None;
        let mut per_period_native = Vec::new();
        // Open-ended schedules have no period count to divide by.
        if investment.recurrence.is_bounded() && !schedule.is_empty() {
            let periods = Decimal::from(schedule.len());
            per_period = Some(cost_base / periods);
            if let Some(allocation) = self.result.get(&investment.id) {
                for draw in &allocation.draws {
                    let currency = self
                        .snapshot
                        .account(&draw.account_id)
                        .map(|a| a.currency.as_str())
                        .unwrap_or(self.settings.base_currency.as_str());
                    per_period_native.push(format!(
                        "{} {}",
                        format_amount(draw.amount / periods),
                        currency
                    ));
                }
            }
        }
        InvestmentFigures {
            cost_base,
            per_period,
            per_period_native,
            progress: CompletionCount::from_schedule(&schedule),
            overspent: self.result.is_overspent(&investment.id),
        }
    }

    fn group_path(hierarchy: &GroupHierarchy<'_>, group_id: Option<&str>) -> Result<Option<String>> {
        let Some(group_id) = group_id else {
            return Ok(None);
        };
        let path = hierarchy.path(group_id)?;
        if path.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            path.iter()
                .map(|g| g.name.as_str())
                .collect::<Vec<_>>()
                .join(" / "),
        ))
    }

    /// One header line, then a row per account followed by a row per
    /// investment in allocation order.
    pub fn to_csv(&self) -> Result<String> {
        let converter = self.converter()?;
        let hierarchy = GroupHierarchy::new(&self.snapshot.groups);
        let mut writer = csv::Writer::from_writer(Vec::new());

        for account in &self.snapshot.accounts {
            let balance = account.effective_balance();
            writer.serialize(ExportRow {
                kind: "account",
                id: account.id.clone(),
                name: account.name.clone(),
                group: None,
                currency: account.currency.clone(),
                amount: Some(format_amount(balance)),
                base_amount: format_amount(converter.checked_to_base(balance, &account.currency)?),
                remaining: Some(format_amount(self.remaining(account))),
                percentage: None,
                per_period: None,
                per_period_native: None,
                progress: None,
                status: None,
            })?;
        }

        for investment in &self.snapshot.investments {
            let figures = self.figures(investment);
            writer.serialize(ExportRow {
                kind: "investment",
                id: investment.id.clone(),
                name: investment.name.clone(),
                group: Self::group_path(&hierarchy, investment.group_id.as_deref())?,
                currency: converter.base_currency().to_string(),
                amount: None,
                base_amount: format_amount(figures.cost_base),
                remaining: None,
                percentage: Some(format_amount(investment.percentage)),
                per_period: figures.per_period.map(format_amount),
                per_period_native: (!figures.per_period_native.is_empty())
                    .then(|| figures.per_period_native.join(" + ")),
                progress: Some(format_progress(figures.progress)),
                status: Some(if figures.overspent { "overspent" } else { "ok" }),
            })?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::Export(e.to_string()))
    }

    /// Human-readable plan: exchange rate, accounts, the group tree with
    /// each group's share of the total, then ungrouped investments.
    pub fn to_text(&self) -> Result<String> {
        let converter = self.converter()?;
        let hierarchy = GroupHierarchy::new(&self.snapshot.groups);
        let base = converter.base_currency();
        let mut out = String::new();

        writeln!(
            out,
            "Exchange rate: 1 {} = {} {}",
            self.settings.foreign_currency,
            format_amount(converter.rate()),
            base
        )?;
        writeln!(out, "Total funds: {} {}", format_amount(self.result.total_funds), base)?;

        writeln!(out)?;
        writeln!(out, "Accounts")?;
        for account in &self.snapshot.accounts {
            let balance = account.effective_balance();
            let native = format!("{} {}", format_amount(balance), account.currency);
            let display = if converter.is_base(&account.currency) {
                native
            } else {
                format!(
                    "{} = {} {}",
                    native,
                    format_amount(converter.checked_to_base(balance, &account.currency)?),
                    base
                )
            };
            writeln!(
                out,
                "  {}: {} (remaining {} {})",
                account.name,
                display,
                format_amount(self.remaining(account)),
                account.currency
            )?;
        }

        let roots = hierarchy.roots();
        if !roots.is_empty() {
            writeln!(out)?;
            writeln!(out, "Groups")?;
            for group in roots {
                self.write_group(&mut out, &hierarchy, group, 1)?;
            }
        }

        let ungrouped: Vec<&Investment> = self
            .snapshot
            .investments
            .iter()
            .filter(|i| match i.group_id.as_deref() {
                None => true,
                Some(group_id) => hierarchy.get(group_id).is_none(),
            })
            .collect();
        if !ungrouped.is_empty() {
            writeln!(out)?;
            writeln!(out, "Ungrouped")?;
            for investment in ungrouped {
                self.write_investment(&mut out, investment, base, 1)?;
            }
        }

        Ok(out)
    }

    fn write_group(
        &self,
        out: &mut String,
        hierarchy: &GroupHierarchy<'_>,
        group: &Group,
        depth: usize,
    ) -> Result<()> {
        let scoped = hierarchy
            .scoped_fraction(Some(&group.id))?
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| Error::invalid_input(format!("Group '{}' scopes too much", group.id)))?;
        writeln!(
            out,
            "{}{} ({}% of total)",
            indent(depth),
            group.name,
            format_amount(scoped)
        )?;
        for investment in self
            .snapshot
            .investments
            .iter()
            .filter(|i| i.group_id.as_deref() == Some(group.id.as_str()))
        {
            self.write_investment(out, investment, self.settings.base_currency.as_str(), depth + 1)?;
        }
        for child in hierarchy.children(&group.id) {
            self.write_group(out, hierarchy, child, depth + 1)?;
        }
        Ok(())
    }

    fn write_investment(
        &self,
        out: &mut String,
        investment: &Investment,
        base: &str,
        depth: usize,
    ) -> Result<()> {
        let figures = self.figures(investment);
        let mut line = format!(
            "{}{}: {}% = {} {}",
            indent(depth),
            investment.name,
            format_amount(investment.percentage),
            format_amount(figures.cost_base),
            base
        );
        if let Some(per_period) = figures.per_period {
            write!(line, ", {} {} per period", format_amount(per_period), base)?;
            if !figures.per_period_native.is_empty() {
                write!(line, " ({})", figures.per_period_native.join(" + "))?;
            }
        }
        write!(line, ", {} done", format_progress(figures.progress))?;
        if figures.overspent {
            line.push_str(" [OVERSPENT]");
        }
        writeln!(out, "{}", line)?;
        Ok(())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn format_amount(value: Decimal) -> String {
    let rounded =
        value.round_dp_with_strategy(DISPLAY_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", DISPLAY_DECIMAL_PRECISION as usize, rounded)
}

fn format_progress(progress: CompletionCount) -> String {
    format!("{}/{}", progress.completed, progress.total)
}
