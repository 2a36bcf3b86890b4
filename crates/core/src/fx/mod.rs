//! FX module - single-rate conversion between the base and foreign currency.

pub mod currency_converter;

pub use currency_converter::CurrencyConverter;
