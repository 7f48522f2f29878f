//! Wagering domain types.
//!
//! Defines the player ledger, bout records, and bet-limit settings used by the
//! execution layer and clients.

mod bout;
mod constants;
mod limits;
mod player;

pub use bout::*;
pub use constants::*;
pub use limits::*;
pub use player::*;
