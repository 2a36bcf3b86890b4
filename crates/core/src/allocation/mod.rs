//! Allocation module - the waterfall engine and its derived results.

mod allocation_engine;
mod allocation_model;


pub use allocation_engine::{recompute, AllocationEngine};
pub use allocation_model::{AccountDraw, AllocationResult, InvestmentAllocation};
