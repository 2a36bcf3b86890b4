//! Investments module - funding target models.

mod investments_model;

pub use investments_model::{Investment, InvestmentUpdate, NewInvestment};
