use chrono::{Datelike, Days, NaiveDate};

/// Advances a date by whole days. Returns `None` past the supported range.
pub fn add_days(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
}

/// Advances a date by calendar months, rolling day-of-month overflow into
/// the following month instead of clamping it.
///
/// Jan 31 + 1 month lands on Mar 2 in 2024 (Feb has 29 days, the two extra
/// days spill over), the same normalization a calendar "set month" applies.
pub fn add_months_normalized(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
    first_of_month.checked_add_days(Days::new(u64::from(date.day0())))
}

/// Advances a date by calendar years. Feb 29 rolls to Mar 1 in a common year.
pub fn add_years_normalized(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    add_months_normalized(date, years.checked_mul(12)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_add_days_crosses_month_and_year() {
        assert_eq!(add_days(d(2024, 1, 31), 1), Some(d(2024, 2, 1)));
        assert_eq!(add_days(d(2023, 12, 25), 7), Some(d(2024, 1, 1)));
    }

    #[test]
    fn test_add_months_plain() {
        assert_eq!(add_months_normalized(d(2024, 1, 15), 1), Some(d(2024, 2, 15)));
        assert_eq!(add_months_normalized(d(2024, 11, 1), 3), Some(d(2025, 2, 1)));
        assert_eq!(add_months_normalized(d(2024, 12, 10), 1), Some(d(2025, 1, 10)));
    }

    #[test]
    fn test_add_months_rolls_overflow_forward() {
        assert_eq!(add_months_normalized(d(2024, 1, 31), 1), Some(d(2024, 3, 2)));
        assert_eq!(add_months_normalized(d(2023, 1, 31), 1), Some(d(2023, 3, 3)));
        assert_eq!(add_months_normalized(d(2024, 3, 31), 1), Some(d(2024, 5, 1)));
    }

    #[test]
    fn test_add_years_leap_day() {
        assert_eq!(add_years_normalized(d(2024, 2, 29), 1), Some(d(2025, 3, 1)));
        assert_eq!(add_years_normalized(d(2024, 2, 29), 4), Some(d(2028, 2, 29)));
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert_eq!(add_months_normalized(NaiveDate::MAX, 1), None);
        assert_eq!(add_days(NaiveDate::MAX, 1), None);
    }
}
