//! Read-only ledger queries.
//!
//! This module exposes the side-effect-free query surface over stored state:
//! limit settings, player records, individual bouts, and the transparency
//! helpers that let any observer re-derive a resolution from public entropy.
//!
//! ## Query Types
//!
//! - [`PlayerInformation`]: registration state plus the bout sequence
//! - [`BoutInformation`]: a single bout with its completion flag
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tombola_execution::query::{query_bout_information, query_player_information};
//!
//! let info = query_player_information(&state, &player).await?;
//! let bout = query_bout_information(&state, &player, &play_id).await?;
//! ```

use commonware_codec::ReadExt;
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use tombola_types::execution::{Key, Value};
use tombola_types::wager::{BetType, Bout, LimitSettings, Player};

use crate::oracle::EntropyOracle;
use crate::roll::compute_roll;
use crate::state::State;

/// Error during ledger queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Play id is absent, zero, or undecodable.
    InvalidPlayId,
    /// Player identity is absent or undecodable.
    InvalidAddress,
    /// The player holds no seed.
    NotRegistered,
    /// No bout with this id in the player's sequence.
    BoutNotFound,
    /// Entropy for the bout's creation view is not revealed yet.
    RandomnessNotReady { view: u64 },
    /// State access error.
    StateError(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPlayId => write!(f, "invalid play id"),
            Self::InvalidAddress => write!(f, "invalid address"),
            Self::NotRegistered => write!(f, "player not registered before"),
            Self::BoutNotFound => write!(f, "bout not found"),
            Self::RandomnessNotReady { view } => {
                write!(f, "randomness not ready for view {view}")
            }
            Self::StateError(msg) => write!(f, "state error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// Decode a caller identity from raw query input.
///
/// Empty or malformed input maps to [`QueryError::InvalidAddress`], keeping
/// the address-variant failure distinguishable at the wire boundary.
pub fn decode_player(bytes: &[u8]) -> Result<PublicKey, QueryError> {
    if bytes.is_empty() {
        return Err(QueryError::InvalidAddress);
    }
    let mut reader = bytes;
    PublicKey::read(&mut reader).map_err(|_| QueryError::InvalidAddress)
}

/// Decode a play id from raw query input.
pub fn decode_play_id(bytes: &[u8]) -> Result<Digest, QueryError> {
    if bytes.is_empty() {
        return Err(QueryError::InvalidPlayId);
    }
    let mut reader = bytes;
    Digest::read(&mut reader).map_err(|_| QueryError::InvalidPlayId)
}

fn is_zero_play_id(play_id: &Digest) -> bool {
    *play_id == Digest::from([0u8; 32])
}

/// Full player record view.
///
/// An absent seed is informative (the player is not registered), not an
/// error, so this query succeeds for unknown players too.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerInformation {
    pub player: PublicKey,
    pub seed: Option<Digest>,
    pub registered_at_view: Option<u64>,
    /// Bouts in placement order.
    pub bouts: Vec<Bout>,
}

/// A single bout with its completion flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoutInformation {
    pub play_id: Digest,
    pub amount: u64,
    pub bet_type: BetType,
    pub created_at_view: u64,
    pub award: i64,
    pub is_complete: bool,
}

impl BoutInformation {
    fn from_bout(bout: &Bout) -> Self {
        Self {
            play_id: bout.play_id,
            amount: bout.amount,
            bet_type: bout.bet_type,
            created_at_view: bout.created_at_view,
            award: bout.award,
            is_complete: bout.is_complete(),
        }
    }
}

async fn load_player<S: State>(
    state: &S,
    player: &PublicKey,
) -> Result<Option<Player>, QueryError> {
    match state.get(&Key::Player(player.clone())).await {
        Ok(Some(Value::Player(player))) => Ok(Some(player)),
        Ok(_) => Ok(None),
        Err(err) => Err(QueryError::StateError(err.to_string())),
    }
}

async fn load_bout<S: State>(state: &S, play_id: &Digest) -> Result<Option<Bout>, QueryError> {
    match state.get(&Key::Bout(*play_id)).await {
        Ok(Some(Value::Bout(bout))) => Ok(Some(bout)),
        Ok(_) => Ok(None),
        Err(err) => Err(QueryError::StateError(err.to_string())),
    }
}

/// Query the current bet limit settings.
///
/// Falls back to the reference defaults when governance has never replaced
/// them.
pub async fn query_limit_settings<S: State>(state: &S) -> Result<LimitSettings, QueryError> {
    match state.get(&Key::Limits).await {
        Ok(Some(Value::Limits(limits))) => Ok(limits),
        Ok(_) => Ok(LimitSettings::default()),
        Err(err) => Err(QueryError::StateError(err.to_string())),
    }
}

/// Query a player's full record, materializing their bout sequence.
pub async fn query_player_information<S: State>(
    state: &S,
    player: &PublicKey,
) -> Result<PlayerInformation, QueryError> {
    let record = load_player(state, player).await?.unwrap_or_default();

    let mut bouts = Vec::with_capacity(record.bouts.len());
    for play_id in &record.bouts {
        let bout = load_bout(state, play_id)
            .await?
            .ok_or_else(|| QueryError::StateError(format!("missing bout record {play_id:?}")))?;
        bouts.push(bout);
    }

    Ok(PlayerInformation {
        player: player.clone(),
        seed: record.seed,
        registered_at_view: record.registered_at_view,
        bouts,
    })
}

/// Query a single bout in a player's sequence.
pub async fn query_bout_information<S: State>(
    state: &S,
    player: &PublicKey,
    play_id: &Digest,
) -> Result<BoutInformation, QueryError> {
    if is_zero_play_id(play_id) {
        return Err(QueryError::InvalidPlayId);
    }

    let record = load_player(state, player).await?;
    match record {
        Some(record) if record.is_registered() => {}
        _ => return Err(QueryError::NotRegistered),
    }

    match load_bout(state, play_id).await? {
        Some(bout) if bout.player == *player => Ok(BoutInformation::from_bout(&bout)),
        _ => Err(QueryError::BoutNotFound),
    }
}

/// Recompute the roll for a bout from public entropy.
///
/// This exists for transparency: any observer can verify a resolution was
/// computed correctly without trusting the operator.
pub async fn query_random_number<S: State, O: EntropyOracle>(
    state: &S,
    oracle: &O,
    play_id: &Digest,
) -> Result<u8, QueryError> {
    if is_zero_play_id(play_id) {
        return Err(QueryError::InvalidPlayId);
    }
    let Some(bout) = load_bout(state, play_id).await? else {
        return Err(QueryError::InvalidPlayId);
    };

    let entropy = oracle
        .entropy_for(bout.created_at_view)
        .map_err(|_| QueryError::RandomnessNotReady {
            view: bout.created_at_view,
        })?;
    Ok(compute_roll(&entropy, play_id))
}

/// Query the stored award for a bout (zero while unresolved).
pub async fn query_award<S: State>(state: &S, play_id: &Digest) -> Result<i64, QueryError> {
    if is_zero_play_id(play_id) {
        return Err(QueryError::InvalidPlayId);
    }
    match load_bout(state, play_id).await? {
        Some(bout) => Ok(bout.award),
        None => Err(QueryError::BoutNotFound),
    }
}
