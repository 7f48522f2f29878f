use anyhow::Result;
use commonware_consensus::Viewable;
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::{Digest, Sha256},
    Hasher,
};
use std::collections::BTreeMap;
use tombola_types::{
    execution::{Event, Instruction, Key, Output, Transaction, Value},
    Seed,
};
use tracing::debug;

use crate::auth::Authorizer;
use crate::custody::{Custody, CustodyError};
use crate::oracle::{EntropyError, EntropyOracle};
use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

/// Typed failure surface of the wagering instruction set.
///
/// Every variant maps to a stable `WagerFailed` event code so embedding nodes
/// can surface the cause without string matching. All failures are terminal
/// for the call: nothing is staged before the failing check passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WagerError {
    /// Caller does not hold the governance capability.
    Unauthorized,
    /// Malformed argument (bad limit bounds, zero identifiers).
    InvalidInput(&'static str),
    /// Register called while a seed is already present.
    AlreadyRegistered,
    /// Operation requires a registered player.
    NotRegistered,
    /// Bet amount is zero or outside the configured bounds.
    InvalidBetAmount { amount: u64, min: u64, max: u64 },
    /// Resolution requested by a player with no bouts at all.
    PlayerNeverPlayed,
    /// No bout with this id in the caller's sequence.
    BoutNotFound,
    /// Entropy for the bout's creation view has not been revealed yet; retry
    /// after more views elapse.
    RandomnessNotReady { view: u64 },
    /// The bout was already settled; awards are never recomputed.
    AlreadyResolved,
    /// The custody collaborator refused the transfer.
    Custody(CustodyError),
}

impl WagerError {
    /// Stable event code for this error.
    pub fn code(&self) -> u8 {
        match self {
            Self::Unauthorized => tombola_types::wager::ERROR_UNAUTHORIZED,
            Self::InvalidInput(_) => tombola_types::wager::ERROR_INVALID_INPUT,
            Self::AlreadyRegistered => tombola_types::wager::ERROR_ALREADY_REGISTERED,
            Self::NotRegistered => tombola_types::wager::ERROR_NOT_REGISTERED,
            Self::InvalidBetAmount { .. } => tombola_types::wager::ERROR_INVALID_BET_AMOUNT,
            Self::PlayerNeverPlayed => tombola_types::wager::ERROR_PLAYER_NEVER_PLAYED,
            Self::BoutNotFound => tombola_types::wager::ERROR_BOUT_NOT_FOUND,
            Self::RandomnessNotReady { .. } => tombola_types::wager::ERROR_RANDOMNESS_NOT_READY,
            Self::AlreadyResolved => tombola_types::wager::ERROR_ALREADY_RESOLVED,
            Self::Custody(_) => tombola_types::wager::ERROR_CUSTODY,
        }
    }
}

impl std::fmt::Display for WagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "no permission"),
            Self::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Self::AlreadyRegistered => write!(f, "already registered"),
            Self::NotRegistered => write!(f, "player not registered before"),
            Self::InvalidBetAmount { amount, min, max } => {
                write!(f, "invalid bet amount {amount} (limits {min}..={max})")
            }
            Self::PlayerNeverPlayed => write!(f, "player never joined this game"),
            Self::BoutNotFound => write!(f, "bout not found"),
            Self::RandomnessNotReady { view } => {
                write!(f, "randomness not ready for view {view}")
            }
            Self::AlreadyResolved => write!(f, "bout already resolved"),
            Self::Custody(err) => write!(f, "custody transfer failed: {err}"),
        }
    }
}

impl std::error::Error for WagerError {}

impl From<CustodyError> for WagerError {
    fn from(err: CustodyError) -> Self {
        Self::Custody(err)
    }
}

impl From<EntropyError> for WagerError {
    fn from(err: EntropyError) -> Self {
        match err {
            EntropyError::Unavailable { view } => Self::RandomnessNotReady { view },
        }
    }
}

/// Recompute the play id for a player's `index`-th bout.
///
/// Derivation is a hash of the player's seed and the bout counter, so clients
/// can look up bouts without a secondary index.
pub fn derive_play_id(seed: &Digest, index: u64) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_ref());
    hasher.update(&index.to_be_bytes());
    hasher.update(b"play-id"); // Domain separator
    hasher.finalize()
}

/// Deterministic wagering instruction executor for one block.
///
/// Writes are staged in a pending overlay and only published by [`Layer::commit`].
/// Each instruction is all-or-nothing: every fallible step (validation, custody)
/// runs before the first staged write.
pub struct Layer<'a, S: State, O: EntropyOracle, C: Custody, A: Authorizer> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    oracle: &'a O,
    custody: &'a mut C,
    authorizer: &'a A,

    seed: Seed,
    seed_view: u64,
}

impl<'a, S: State, O: EntropyOracle, C: Custody, A: Authorizer> Layer<'a, S, O, C, A> {
    pub fn new(
        state: &'a S,
        oracle: &'a O,
        custody: &'a mut C,
        authorizer: &'a A,
        seed: Seed,
    ) -> Self {
        let seed_view = seed.view();
        Self {
            state,
            pending: BTreeMap::new(),

            oracle,
            custody,
            authorizer,

            seed,
            seed_view,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    pub fn view(&self) -> u64 {
        self.seed_view
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    pub(crate) async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let public = &transaction.public;

        match &transaction.instruction {
            Instruction::Register => self.handle_register(public).await,
            Instruction::Quit => self.handle_quit(public).await,
            Instruction::Play { amount, bet_type } => {
                self.handle_play(public, *amount, *bet_type).await
            }
            Instruction::Bingo { play_id } => self.handle_bingo(public, play_id).await,
            Instruction::SetLimits {
                min_amount,
                max_amount,
            } => {
                self.handle_set_limits(public, *min_amount, *max_amount)
                    .await
            }
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err.context("state error during prepare"));
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await?.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State, O: EntropyOracle, C: Custody, A: Authorizer> State for Layer<'a, S, O, C, A> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}
