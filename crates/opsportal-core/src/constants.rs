//! Shared constants

use uuid::Uuid;

/// Identity used for requests authenticated with the master API key.
pub const SERVICE_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

/// Upper bound for a single time entry.
pub const MAX_HOURS_PER_ENTRY: i64 = 24;

/// Time entry hours are stored as NUMERIC(10,2).
pub const HOURS_SCALE: u32 = 2;

pub const MAX_DESCRIPTION_LENGTH: u64 = 2000;

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;
