use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use thiserror::Error as ThisError;

/// Bet direction chosen at placement time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BetType {
    Small,
    Large,
}

impl Write for BetType {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Small => 0u8.write(writer),
            Self::Large => 1u8.write(writer),
        }
    }
}

impl Read for BetType {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Small),
            1 => Ok(Self::Large),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for BetType {
    fn encode_size(&self) -> usize {
        u8::SIZE
    }
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum BoutInvariantError {
    #[error("unresolved bout carries an award (award={award})")]
    AwardBeforeResolution { award: i64 },
    #[error("resolved award must be +/- amount (amount={amount}, award={award})")]
    AwardMismatch { amount: u64, award: i64 },
}

/// A single placed bet awaiting or having received resolution.
///
/// Bouts are created by `Play`, mutated exactly once by resolution
/// (unresolved to resolved), and never deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bout {
    /// Derived from the owner's seed and bout counter, so it can be recomputed
    /// for lookup without a secondary index.
    pub play_id: Digest,
    pub player: PublicKey,
    pub amount: u64,
    pub bet_type: BetType,
    /// View in which the bet was locked in; entropy for this view is undefined
    /// until the round completes.
    pub created_at_view: u64,
    /// Signed net result: `amount` on a win, `-amount` on a loss, 0 while
    /// unresolved.
    pub award: i64,
    pub resolved: bool,
}

impl Bout {
    pub fn new(
        play_id: Digest,
        player: PublicKey,
        amount: u64,
        bet_type: BetType,
        created_at_view: u64,
    ) -> Self {
        Self {
            play_id,
            player,
            amount,
            bet_type,
            created_at_view,
            award: 0,
            resolved: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.resolved
    }

    pub fn validate_invariants(&self) -> Result<(), BoutInvariantError> {
        if !self.resolved && self.award != 0 {
            return Err(BoutInvariantError::AwardBeforeResolution { award: self.award });
        }
        if self.resolved {
            let amount = self.amount as i128;
            let award = self.award as i128;
            if award != amount && award != -amount {
                return Err(BoutInvariantError::AwardMismatch {
                    amount: self.amount,
                    award: self.award,
                });
            }
        }
        Ok(())
    }
}

impl Write for Bout {
    fn write(&self, writer: &mut impl BufMut) {
        self.play_id.write(writer);
        self.player.write(writer);
        self.amount.write(writer);
        self.bet_type.write(writer);
        self.created_at_view.write(writer);
        self.award.write(writer);
        self.resolved.write(writer);
    }
}

impl Read for Bout {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            play_id: Digest::read(reader)?,
            player: PublicKey::read(reader)?,
            amount: u64::read(reader)?,
            bet_type: BetType::read(reader)?,
            created_at_view: u64::read(reader)?,
            award: i64::read(reader)?,
            resolved: bool::read(reader)?,
        })
    }
}

impl EncodeSize for Bout {
    fn encode_size(&self) -> usize {
        self.play_id.encode_size()
            + self.player.encode_size()
            + self.amount.encode_size()
            + self.bet_type.encode_size()
            + self.created_at_view.encode_size()
            + self.award.encode_size()
            + self.resolved.encode_size()
    }
}
