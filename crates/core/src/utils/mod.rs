pub mod serde_utils;
pub mod time_utils;
