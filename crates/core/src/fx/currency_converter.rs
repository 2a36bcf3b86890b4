use rust_decimal::Decimal;

use crate::errors::{Error, Result};

/// Converts amounts between the base currency and the single foreign
/// currency using one scalar rate (base units per foreign unit).
///
/// Any currency code other than the base is treated as the foreign unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyConverter {
    base_currency: String,
    rate: Decimal,
}

impl CurrencyConverter {
    /// Creates a converter. The rate must be strictly positive.
    pub fn new(base_currency: impl Into<String>, rate: Decimal) -> Result<Self> {
        if rate <= Decimal::ZERO {
            return Err(Error::InvalidExchangeRate(format!(
                "rate must be greater than zero, got {}",
                rate
            )));
        }
        Ok(CurrencyConverter {
            base_currency: base_currency.into(),
            rate,
        })
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn is_base(&self, currency: &str) -> bool {
        currency == self.base_currency
    }

    /// Native amount -> base amount.
    pub fn to_base(&self, amount: Decimal, currency: &str) -> Decimal {
        if self.is_base(currency) {
            amount
        } else {
            amount * self.rate
        }
    }

    /// Native amount -> base amount, failing instead of overflowing.
    pub fn checked_to_base(&self, amount: Decimal, currency: &str) -> Result<Decimal> {
        if self.is_base(currency) {
            return Ok(amount);
        }
        amount.checked_mul(self.rate).ok_or_else(|| {
            Error::invalid_input(format!(
                "{} {} is too large to convert at rate {}",
                amount, currency, self.rate
            ))
        })
    }

    /// Base amount -> native amount.
    pub fn from_base(&self, amount: Decimal, currency: &str) -> Decimal {
        if self.is_base(currency) {
            amount
        } else {
            amount / self.rate
        }
    }
}
