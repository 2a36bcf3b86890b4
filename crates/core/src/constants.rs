use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Base currency code; all allocation math is normalized to this unit
pub const DEFAULT_BASE_CURRENCY: &str = "THB";

/// The single foreign currency an account may be held in
pub const DEFAULT_FOREIGN_CURRENCY: &str = "USD";

/// Base units per one foreign unit when nothing else is configured
pub const DEFAULT_EXCHANGE_RATE: Decimal = dec!(32);

/// Absolute tolerance, in base units, for "need satisfied" comparisons
pub const ALLOCATION_TOLERANCE: Decimal = dec!(0.01);

/// Runaway-recurrence limit for schedule generation
pub const MAX_SCHEDULE_ITERATIONS: usize = 500;

/// Percentage a group scopes when none is given
pub const DEFAULT_GROUP_PERCENTAGE: Decimal = dec!(100);

/// Date format used for persisted calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
