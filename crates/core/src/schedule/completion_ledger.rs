//! Record of which scheduled contribution dates have been executed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::serde_utils::{lenient_date, serialize_date};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEntry {
    #[serde(deserialize_with = "lenient_date", serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub completed: bool,
}

/// Sparse set of completion flags keyed by calendar date.
///
/// Entries are only ever created by [`CompletionLedger::toggle`]; a toggled
/// off entry stays in the ledger with `completed = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct CompletionLedger {
    entries: Vec<CompletionEntry>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CompletionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when an entry for `date` exists and is flagged completed.
    pub fn is_completed(&self, date: NaiveDate) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.date == date && entry.completed)
    }

    /// Flips the flag for `date`, inserting a completed entry when the date
    /// has never been toggled. Returns the new flag.
    pub fn toggle(&mut self, date: NaiveDate) -> bool {
        match self.entries.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => {
                entry.completed = !entry.completed;
                entry.completed
            }
            None => {
                self.entries.push(CompletionEntry {
                    date,
                    completed: true,
                });
                true
            }
        }
    }
}
