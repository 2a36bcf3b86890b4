//! Schedule module - recurrence configuration, the completion ledger and
//! the contribution calendar generator.

mod completion_ledger;
mod recurrence;
mod schedule_generator;

pub use completion_ledger::{CompletionEntry, CompletionLedger};
pub use recurrence::{CustomUnit, Interval, Recurrence, RecurrenceType};
pub use schedule_generator::{generate_schedule, CompletionCount, ScheduleEntry};
