//! Expands a recurrence into concrete contribution dates.

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

use super::completion_ledger::CompletionLedger;
use super::recurrence::Recurrence;
use crate::utils::serde_utils::serialize_date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCount {
    pub completed: usize,
    pub total: usize,
}

impl CompletionCount {
    pub fn from_schedule(schedule: &[ScheduleEntry]) -> Self {
        Self {
            completed: schedule.iter().filter(|entry| entry.completed).count(),
            total: schedule.len(),
        }
    }
}

/// Generates the contribution calendar for one recurrence.
///
/// * Bounded (end date set): every date from the start through the end date.
/// * Open-ended: completed dates in order, followed by the first outstanding
///   date, which is the next one due.
///
/// At most `max_iterations` dates are produced. A schedule that stops at the
/// cap may be incomplete.
pub fn generate_schedule(
    recurrence: &Recurrence,
    ledger: &CompletionLedger,
    max_iterations: usize,
) -> Vec<ScheduleEntry> {
    let interval = recurrence.interval();
    let mut schedule = Vec::new();
    let mut current = Some(recurrence.start_date);

    match recurrence.end_date {
        Some(end) => {
            while let Some(date) = current.filter(|d| *d <= end) {
                if schedule.len() >= max_iterations {
                    warn!(
                        "Schedule starting {} truncated at {} entries",
                        recurrence.start_date, max_iterations
                    );
                    break;
                }
                schedule.push(ScheduleEntry {
                    date,
                    completed: ledger.is_completed(date),
                });
                current = interval.advance(date);
            }
        }
        None => {
            while let Some(date) = current {
                if schedule.len() >= max_iterations {
                    warn!(
                        "Open-ended schedule starting {} truncated at {} completed entries",
                        recurrence.start_date, max_iterations
                    );
                    break;
                }
                let completed = ledger.is_completed(date);
                schedule.push(ScheduleEntry { date, completed });
                if !completed {
                    break;
                }
                current = interval.advance(date);
            }
        }
    }

    schedule
}
