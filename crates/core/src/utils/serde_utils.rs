//! Forgiving serde adapters for snapshots written by form-driven clients.
//!
//! Numeric fields may arrive as numbers or as strings, and dates either as
//! plain calendar dates or as full timestamps. Anything that cannot be read
//! is normalized to a safe default instead of failing the whole snapshot.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

use crate::constants::DATE_FORMAT;

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads an id written either as a string or as a number (`1700000000000`
/// becomes `"1700000000000"`).
pub fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a string or numeric id, got {}", value)))
}

/// Optional reference to another entity. Null and empty strings mean no reference.
pub fn lenient_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(value) => match id_from_value(&value) {
            Some(id) if id.trim().is_empty() => Ok(None),
            Some(id) => Ok(Some(id)),
            None => Err(D::Error::custom(format!(
                "expected a string or numeric id, got {}",
                value
            ))),
        },
    }
}

/// List of ids; entries that are neither strings nor numbers are dropped.
pub fn lenient_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .iter()
        .filter_map(id_from_value)
        .collect())
}

/// Reads a decimal from a number or numeric string.
/// Null, empty, non-numeric and negative values become zero.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal_from_value(&value)
        .filter(|d| d.is_sign_positive())
        .unwrap_or(Decimal::ZERO))
}

/// Reads a positive whole count; fractions are floored and anything below
/// one (or unreadable) becomes `None`.
pub fn lenient_positive_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(decimal_from_value)
        .map(|d| d.floor())
        .and_then(|d| d.to_u32())
        .filter(|n| *n >= 1))
}

/// Parses a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
/// The time of day is discarded; the date is taken as written.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            // "2024-01-01T00:00:00" without an offset
            trimmed
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok())
        })
}

pub fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid calendar date '{}'", raw)))
}

pub fn lenient_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_calendar_date(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid calendar date '{}'", s))),
    }
}

pub fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
}

pub fn serialize_optional_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serialize_date(d, serializer),
        None => serializer.serialize_none(),
    }
}
