//! Planner configuration.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ALLOCATION_TOLERANCE, DEFAULT_BASE_CURRENCY, DEFAULT_EXCHANGE_RATE, DEFAULT_FOREIGN_CURRENCY,
    MAX_SCHEDULE_ITERATIONS,
};
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerSettings {
    pub base_currency: String,
    pub foreign_currency: String,
    /// Rate a fresh plan starts with, in base units per foreign unit
    pub default_exchange_rate: Decimal,
    /// Absolute tolerance in base units for "need satisfied" checks
    pub allocation_tolerance: Decimal,
    /// Upper bound on generated schedule entries per investment
    pub max_schedule_iterations: usize,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            foreign_currency: DEFAULT_FOREIGN_CURRENCY.to_string(),
            default_exchange_rate: DEFAULT_EXCHANGE_RATE,
            allocation_tolerance: ALLOCATION_TOLERANCE,
            max_schedule_iterations: MAX_SCHEDULE_ITERATIONS,
        }
    }
}

impl PlannerSettings {
    /// Parses and validates settings from JSON. Missing keys take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let settings: PlannerSettings = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidConfigValue(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_json_str(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "No settings file at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(Error::ConfigIO(format!("{}: {}", path.display(), e))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_currency.trim().is_empty() || self.foreign_currency.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "currency codes cannot be empty".to_string(),
            ));
        }
        if self.base_currency == self.foreign_currency {
            return Err(Error::InvalidConfigValue(format!(
                "base and foreign currency must differ, both are '{}'",
                self.base_currency
            )));
        }
        if self.default_exchange_rate <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "defaultExchangeRate must be positive, got {}",
                self.default_exchange_rate
            )));
        }
        if self.allocation_tolerance <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(format!(
                "allocationTolerance must be positive, got {}",
                self.allocation_tolerance
            )));
        }
        if self.max_schedule_iterations == 0 {
            return Err(Error::InvalidConfigValue(
                "maxScheduleIterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_supported_currency(&self, currency: &str) -> bool {
        currency == self.base_currency || currency == self.foreign_currency
    }
}
