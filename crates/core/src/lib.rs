//! Fundplan Core - allocation and contribution scheduling engine.
//!
//! This crate contains the planning logic for a personal funding plan:
//! multi-currency accounts, percentage-based budget groups and investment
//! targets that drain prioritized accounts, plus the recurring contribution
//! calendar of each investment. It is storage-agnostic and defines the
//! repository trait a persistence layer implements.

pub mod accounts;
pub mod allocation;
pub mod constants;
pub mod errors;
pub mod export;
pub mod fx;
pub mod groups;
pub mod investments;
pub mod plan;
pub mod schedule;
pub mod settings;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
