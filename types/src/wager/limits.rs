use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use thiserror::Error as ThisError;

use super::{DEFAULT_MAX_BET_AMOUNT, DEFAULT_MIN_BET_AMOUNT};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum LimitsInvariantError {
    #[error("min_amount must be positive")]
    NonPositiveMin,
    #[error("min_amount exceeds max_amount (min={min}, max={max})")]
    MinAboveMax { min: u64, max: u64 },
}

/// Bet-amount bounds enforced at placement time.
///
/// Replaced atomically by governance; changes are never retroactive, so a bout
/// placed under older bounds stays valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitSettings {
    pub min_amount: u64,
    pub max_amount: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            min_amount: DEFAULT_MIN_BET_AMOUNT,
            max_amount: DEFAULT_MAX_BET_AMOUNT,
        }
    }
}

impl LimitSettings {
    pub fn new(min_amount: u64, max_amount: u64) -> Result<Self, LimitsInvariantError> {
        let settings = Self {
            min_amount,
            max_amount,
        };
        settings.validate_invariants()?;
        Ok(settings)
    }

    pub fn validate_invariants(&self) -> Result<(), LimitsInvariantError> {
        if self.min_amount == 0 {
            return Err(LimitsInvariantError::NonPositiveMin);
        }
        if self.min_amount > self.max_amount {
            return Err(LimitsInvariantError::MinAboveMax {
                min: self.min_amount,
                max: self.max_amount,
            });
        }
        Ok(())
    }

    /// Whether `amount` falls within the configured bounds.
    pub fn permits(&self, amount: u64) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }
}

impl Write for LimitSettings {
    fn write(&self, writer: &mut impl BufMut) {
        self.min_amount.write(writer);
        self.max_amount.write(writer);
    }
}

impl Read for LimitSettings {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            min_amount: u64::read(reader)?,
            max_amount: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LimitSettings {
    fn encode_size(&self) -> usize {
        self.min_amount.encode_size() + self.max_amount.encode_size()
    }
}
