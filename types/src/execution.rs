use crate::wager::{BetType, Bout, LimitSettings, Player};
use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_consensus::threshold_simplex::types::Seed as CSeed;
use commonware_cryptography::{
    bls12381::primitives::variant::{MinSig, Variant},
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

pub const NAMESPACE: &[u8] = b"_TOMBOLA";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

pub type Seed = CSeed<MinSig>;

pub type Identity = <MinSig as Variant>::Public;

/// Maximum length of the message carried by a `WagerFailed` event.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 256;

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            Some(&transaction_namespace(NAMESPACE)),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Register the caller as a player, deriving a fresh per-player seed.
    /// Binary: [10]
    Register,

    /// Clear the caller's registration gate. Bout history is retained.
    /// Binary: [11]
    Quit,

    /// Place a bet, escrowing `amount` with the custody collaborator.
    /// Binary: [12] [amount:u64 BE] [betType:u8]
    Play { amount: u64, bet_type: BetType },

    /// Resolve a previously placed bout against revealed entropy.
    /// Binary: [13] [playId:32]
    Bingo { play_id: Digest },

    /// Replace the bet limit settings (governance only).
    /// Binary: [14] [min:u64 BE] [max:u64 BE]
    SetLimits { min_amount: u64, max_amount: u64 },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Register => 10u8.write(writer),
            Self::Quit => 11u8.write(writer),
            Self::Play { amount, bet_type } => {
                12u8.write(writer);
                amount.write(writer);
                bet_type.write(writer);
            }
            Self::Bingo { play_id } => {
                13u8.write(writer);
                play_id.write(writer);
            }
            Self::SetLimits {
                min_amount,
                max_amount,
            } => {
                14u8.write(writer);
                min_amount.write(writer);
                max_amount.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match reader.get_u8() {
            10 => Self::Register,
            11 => Self::Quit,
            12 => Self::Play {
                amount: u64::read(reader)?,
                bet_type: BetType::read(reader)?,
            },
            13 => Self::Bingo {
                play_id: Digest::read(reader)?,
            },
            14 => Self::SetLimits {
                min_amount: u64::read(reader)?,
                max_amount: u64::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Register | Self::Quit => 0,
                Self::Play { amount, bet_type } => amount.encode_size() + bet_type.encode_size(),
                Self::Bingo { .. } => Digest::SIZE,
                Self::SetLimits {
                    min_amount,
                    max_amount,
                } => min_amount.encode_size() + max_amount.encode_size(),
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
/// Used for replay protection across all transaction types.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),

    // Wager keys (tags 10-12)
    Player(PublicKey),
    Bout(Digest),
    Limits,
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Account key (tag 0)
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }

            // Wager keys (tags 10-12)
            Self::Player(pk) => {
                10u8.write(writer);
                pk.write(writer);
            }
            Self::Bout(id) => {
                11u8.write(writer);
                id.write(writer);
            }
            Self::Limits => 12u8.write(writer),
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match reader.get_u8() {
            // Account key (tag 0)
            0 => Self::Account(PublicKey::read(reader)?),

            // Wager keys (tags 10-12)
            10 => Self::Player(PublicKey::read(reader)?),
            11 => Self::Bout(Digest::read(reader)?),
            12 => Self::Limits,

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                // Account key
                Self::Account(_) => PublicKey::SIZE,

                // Wager keys
                Self::Player(_) => PublicKey::SIZE,
                Self::Bout(_) => Digest::SIZE,
                Self::Limits => 0,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    /// Account for nonce tracking (tag 0)
    Account(Account),

    // System values
    Commit {
        height: u64,
        start: u64,
    },

    // Wager values (tags 10-12)
    Player(Player),
    Bout(Bout),
    Limits(LimitSettings),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Account value (tag 0)
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }

            // System values
            Self::Commit { height, start } => {
                3u8.write(writer);
                height.write(writer);
                start.write(writer);
            }

            // Wager values (tags 10-12)
            Self::Player(player) => {
                10u8.write(writer);
                player.write(writer);
            }
            Self::Bout(bout) => {
                11u8.write(writer);
                bout.write(writer);
            }
            Self::Limits(limits) => {
                12u8.write(writer);
                limits.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match reader.get_u8() {
            // Account value (tag 0)
            0 => Self::Account(Account::read(reader)?),

            // System values
            3 => Self::Commit {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            },

            // Wager values (tags 10-12)
            10 => Self::Player(Player::read(reader)?),
            11 => Self::Bout(Bout::read(reader)?),
            12 => Self::Limits(LimitSettings::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                // Account value
                Self::Account(account) => account.encode_size(),

                // System values
                Self::Commit { height, start } => height.encode_size() + start.encode_size(),

                // Wager values
                Self::Player(player) => player.encode_size(),
                Self::Bout(bout) => bout.encode_size(),
                Self::Limits(limits) => limits.encode_size(),
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Wager events (tags 20-24)
    PlayerRegistered {
        player: PublicKey,
        view: u64,
    },
    PlayerQuit {
        player: PublicKey,
    },
    BoutPlaced {
        player: PublicKey,
        play_id: Digest,
        amount: u64,
        bet_type: BetType,
        created_at_view: u64,
    },
    BoutResolved {
        player: PublicKey,
        play_id: Digest,
        roll: u8,
        won: bool,
        award: i64,
        payout: u64,
    },
    LimitsUpdated {
        min_amount: u64,
        max_amount: u64,
    },

    // Error event (tag 29)
    WagerFailed {
        player: PublicKey,
        play_id: Option<Digest>,
        error_code: u8,
        message: String,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Wager events (tags 20-24)
            Self::PlayerRegistered { player, view } => {
                20u8.write(writer);
                player.write(writer);
                view.write(writer);
            }
            Self::PlayerQuit { player } => {
                21u8.write(writer);
                player.write(writer);
            }
            Self::BoutPlaced {
                player,
                play_id,
                amount,
                bet_type,
                created_at_view,
            } => {
                22u8.write(writer);
                player.write(writer);
                play_id.write(writer);
                amount.write(writer);
                bet_type.write(writer);
                created_at_view.write(writer);
            }
            Self::BoutResolved {
                player,
                play_id,
                roll,
                won,
                award,
                payout,
            } => {
                23u8.write(writer);
                player.write(writer);
                play_id.write(writer);
                roll.write(writer);
                won.write(writer);
                award.write(writer);
                payout.write(writer);
            }
            Self::LimitsUpdated {
                min_amount,
                max_amount,
            } => {
                24u8.write(writer);
                min_amount.write(writer);
                max_amount.write(writer);
            }
            Self::WagerFailed {
                player,
                play_id,
                error_code,
                message,
            } => {
                29u8.write(writer);
                player.write(writer);
                play_id.write(writer);
                error_code.write(writer);
                (message.len() as u32).write(writer);
                writer.put_slice(message.as_bytes());
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match reader.get_u8() {
            // Wager events (tags 20-24)
            20 => Self::PlayerRegistered {
                player: PublicKey::read(reader)?,
                view: u64::read(reader)?,
            },
            21 => Self::PlayerQuit {
                player: PublicKey::read(reader)?,
            },
            22 => Self::BoutPlaced {
                player: PublicKey::read(reader)?,
                play_id: Digest::read(reader)?,
                amount: u64::read(reader)?,
                bet_type: BetType::read(reader)?,
                created_at_view: u64::read(reader)?,
            },
            23 => Self::BoutResolved {
                player: PublicKey::read(reader)?,
                play_id: Digest::read(reader)?,
                roll: u8::read(reader)?,
                won: bool::read(reader)?,
                award: i64::read(reader)?,
                payout: u64::read(reader)?,
            },
            24 => Self::LimitsUpdated {
                min_amount: u64::read(reader)?,
                max_amount: u64::read(reader)?,
            },
            29 => {
                let player = PublicKey::read(reader)?;
                let play_id = Option::<Digest>::read(reader)?;
                let error_code = u8::read(reader)?;
                let message_len = u32::read(reader)? as usize;
                if message_len > MAX_ERROR_MESSAGE_LENGTH {
                    return Err(Error::Invalid("Event", "error message too long"));
                }
                if reader.remaining() < message_len {
                    return Err(Error::EndOfBuffer);
                }
                let mut message_bytes = vec![0u8; message_len];
                reader.copy_to_slice(&mut message_bytes);
                let message = String::from_utf8(message_bytes)
                    .map_err(|_| Error::Invalid("Event", "invalid UTF-8 in error message"))?;
                Self::WagerFailed {
                    player,
                    play_id,
                    error_code,
                    message,
                }
            }

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                // Wager events (tags 20-24)
                Self::PlayerRegistered { player, view } => player.encode_size() + view.encode_size(),
                Self::PlayerQuit { player } => player.encode_size(),
                Self::BoutPlaced {
                    player,
                    play_id,
                    amount,
                    bet_type,
                    created_at_view,
                } => {
                    player.encode_size()
                        + play_id.encode_size()
                        + amount.encode_size()
                        + bet_type.encode_size()
                        + created_at_view.encode_size()
                }
                Self::BoutResolved {
                    player,
                    play_id,
                    roll,
                    won,
                    award,
                    payout,
                } => {
                    player.encode_size()
                        + play_id.encode_size()
                        + roll.encode_size()
                        + won.encode_size()
                        + award.encode_size()
                        + payout.encode_size()
                }
                Self::LimitsUpdated {
                    min_amount,
                    max_amount,
                } => min_amount.encode_size() + max_amount.encode_size(),
                Self::WagerFailed {
                    player,
                    play_id,
                    error_code,
                    message,
                } => {
                    player.encode_size()
                        + play_id.encode_size()
                        + error_code.encode_size()
                        + 4
                        + message.len()
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
    Commit { height: u64, start: u64 },
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Commit { height, start } => {
                2u8.write(writer);
                height.write(writer);
                start.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            2 => Ok(Self::Commit {
                height: u64::read(reader)?,
                start: u64::read(reader)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Commit { height, start } => height.encode_size() + start.encode_size(),
        }
    }
}
