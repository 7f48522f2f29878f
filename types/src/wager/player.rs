use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use commonware_cryptography::sha256::Digest;

use super::MAX_PLAYER_BOUTS;

/// Per-player ledger record.
///
/// `seed` doubles as the registration gate: `None` means the player is not
/// currently registered and every other operation is refused. Bout history and
/// the `bouts_played` counter survive a quit so play identifiers stay unique
/// across re-registrations.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Player {
    /// Secret-ish per-player value feeding play-id derivation. Absent until
    /// registration, cleared again on quit.
    pub seed: Option<Digest>,
    /// View at which the current registration happened.
    pub registered_at_view: Option<u64>,
    /// Monotonic count of bouts ever placed by this player. Never reset.
    pub bouts_played: u64,
    /// Play ids of this player's bouts, in placement order.
    pub bouts: Vec<Digest>,
}

impl Player {
    pub fn is_registered(&self) -> bool {
        self.seed.is_some()
    }

    /// Install a fresh seed and stamp the registration view.
    pub fn register(&mut self, seed: Digest, view: u64) {
        self.seed = Some(seed);
        self.registered_at_view = Some(view);
    }

    /// Clear the registration gate. Bout history is intentionally retained.
    pub fn clear_registration(&mut self) {
        self.seed = None;
        self.registered_at_view = None;
    }
}

impl Write for Player {
    fn write(&self, writer: &mut impl BufMut) {
        self.seed.write(writer);
        self.registered_at_view.write(writer);
        self.bouts_played.write(writer);
        self.bouts.write(writer);
    }
}

impl Read for Player {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            seed: Option::<Digest>::read(reader)?,
            registered_at_view: Option::<u64>::read(reader)?,
            bouts_played: u64::read(reader)?,
            bouts: Vec::<Digest>::read_range(reader, 0..=MAX_PLAYER_BOUTS)?,
        })
    }
}

impl EncodeSize for Player {
    fn encode_size(&self) -> usize {
        self.seed.encode_size()
            + self.registered_at_view.encode_size()
            + self.bouts_played.encode_size()
            + self.bouts.encode_size()
    }
}
