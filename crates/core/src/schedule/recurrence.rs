//! Recurrence configuration and interval arithmetic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::utils::serde_utils::{
    lenient_date, lenient_optional_date, lenient_positive_u32, serialize_date,
    serialize_optional_date,
};
use crate::utils::time_utils::{add_days, add_months_normalized, add_years_normalized};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomUnit {
    Days,
    #[default]
    Months,
    Years,
}

/// How often an investment receives a contribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    #[serde(default, alias = "dcaType")]
    pub recurrence_type: RecurrenceType,
    /// Count for custom recurrences; absent or invalid means 1
    #[serde(
        default,
        alias = "customDcaValue",
        deserialize_with = "lenient_positive_u32"
    )]
    pub custom_value: Option<u32>,
    #[serde(default, alias = "customDcaUnit")]
    pub custom_unit: CustomUnit,
    #[serde(
        alias = "dcaStartDate",
        deserialize_with = "lenient_date",
        serialize_with = "serialize_date"
    )]
    pub start_date: NaiveDate,
    /// Without an end date the schedule is open-ended
    #[serde(
        default,
        alias = "dcaEndDate",
        deserialize_with = "lenient_optional_date",
        serialize_with = "serialize_optional_date"
    )]
    pub end_date: Option<NaiveDate>,
}

impl Recurrence {
    pub fn new(recurrence_type: RecurrenceType, start_date: NaiveDate) -> Self {
        Self {
            recurrence_type,
            custom_value: None,
            custom_unit: CustomUnit::default(),
            start_date,
            end_date: None,
        }
    }

    pub fn custom(value: u32, unit: CustomUnit, start_date: NaiveDate) -> Self {
        Self {
            recurrence_type: RecurrenceType::Custom,
            custom_value: Some(value),
            custom_unit: unit,
            start_date,
            end_date: None,
        }
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.end_date.is_some()
    }

    pub fn interval(&self) -> Interval {
        Interval::for_recurrence(self)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "End date {} is before start date {}",
                    end, self.start_date
                ))));
            }
        }
        if self.recurrence_type == RecurrenceType::Custom && self.custom_value.unwrap_or(0) == 0 {
            return Err(Error::Validation(ValidationError::MissingField(
                "customValue".to_string(),
            )));
        }
        Ok(())
    }
}

/// A single step between two contribution dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl Interval {
    pub fn for_recurrence(recurrence: &Recurrence) -> Self {
        match recurrence.recurrence_type {
            RecurrenceType::Daily => Interval::Days(1),
            RecurrenceType::Weekly => Interval::Days(7),
            RecurrenceType::Monthly => Interval::Months(1),
            RecurrenceType::Quarterly => Interval::Months(3),
            RecurrenceType::Yearly => Interval::Years(1),
            RecurrenceType::Custom => {
                let n = recurrence.custom_value.filter(|n| *n >= 1).unwrap_or(1);
                match recurrence.custom_unit {
                    CustomUnit::Days => Interval::Days(n),
                    CustomUnit::Months => Interval::Months(n),
                    CustomUnit::Years => Interval::Years(n),
                }
            }
        }
    }

    /// Next date after `date`, or `None` once the calendar range runs out.
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Interval::Days(n) => add_days(date, n),
            Interval::Months(n) => add_months_normalized(date, n),
            Interval::Years(n) => add_years_normalized(date, n),
        }
    }
}
