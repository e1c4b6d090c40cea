pub const MIN_LITTER_SIZE: i32 = 1;
pub const MAX_LITTER_SIZE: i32 = 6;

/// Days from pair creation until the litter is born.
pub const CONCEPTION_DAYS: i64 = 3;
/// Fixed weaning period. Never shortened by any user action.
pub const WEAN_DAYS: i64 = 14;

/// Re-breed cooldown stamped on both parents when a pair is created.
/// Collection (or the manual release) clears it early.
pub const REBREED_COOLDOWN_DAYS: i64 = 30;

/// Flat fee for skipping the conception wait, in pax.
pub const ACCELERATION_COST: i32 = 50;
/// Licenses consumed when a pair is created.
pub const LICENSES_PER_PAIR: i32 = 2;

pub const MAX_PET_NAME_LENGTH: usize = 20;
pub const MAX_BABY_DESCRIPTION_LENGTH: usize = 200;

pub const INSUFFICIENT_BALANCE_ERROR: &str = "Insufficient balance";
pub const INSUFFICIENT_LICENSES_ERROR: &str = "Not enough breeding licenses";
pub const NOT_OWNER_ERROR: &str = "You don't own this breeding pair";
pub const NOT_YET_DUE_ERROR: &str = "The litter is not ready for collection yet";
