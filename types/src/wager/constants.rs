/// Smallest denomination of the custody collaborator's token (8 decimals).
pub const UNIT: u64 = 100_000_000;

/// Default minimum bet amount (1 unit).
pub const DEFAULT_MIN_BET_AMOUNT: u64 = UNIT;

/// Default maximum bet amount (100 units).
pub const DEFAULT_MAX_BET_AMOUNT: u64 = 100 * UNIT;

/// Rolls span [0, 255]; a roll strictly above the threshold wins (128 of 256
/// values, an even split).
pub const ROLL_WIN_THRESHOLD: u8 = 127;

/// Maximum bout references a single player record will enumerate when decoding.
pub const MAX_PLAYER_BOUTS: usize = 65_536;

/// Error codes for WagerFailed events
pub const ERROR_UNAUTHORIZED: u8 = 1;
pub const ERROR_INVALID_INPUT: u8 = 2;
pub const ERROR_ALREADY_REGISTERED: u8 = 3;
pub const ERROR_NOT_REGISTERED: u8 = 4;
pub const ERROR_INVALID_BET_AMOUNT: u8 = 5;
pub const ERROR_PLAYER_NEVER_PLAYED: u8 = 6;
pub const ERROR_BOUT_NOT_FOUND: u8 = 7;
pub const ERROR_RANDOMNESS_NOT_READY: u8 = 8;
pub const ERROR_ALREADY_RESOLVED: u8 = 9;
pub const ERROR_CUSTODY: u8 = 10;
