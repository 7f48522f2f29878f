//! Roll derivation for delayed-reveal bout resolution.
//!
//! This module turns revealed consensus entropy into the bounded roll value
//! that decides a bout.
//!
//! ## Commit-delay-reveal flow
//!
//! 1. **Commit** - a bout locks in its amount and type at its creation view
//! 2. **Delay** - entropy for that view is undefined until the view's round
//!    completes; resolution attempts fail until then
//! 3. **Reveal** - the oracle exposes the view's entropy, stable from then on
//! 4. **Resolve** - `roll = sha256(entropy || play_id) mod 256`
//!
//! The entropy value is produced by the consensus process only after the bet
//! is locked in, so neither the bettor nor the operator can predict it at
//! placement time. Because the inputs are public after reveal, any observer
//! can recompute the roll and audit a resolution.

use commonware_cryptography::sha256::{Digest, Sha256};
use commonware_cryptography::Hasher;
use commonware_utils::modulo;
use tombola_types::wager::ROLL_WIN_THRESHOLD;

/// Number of distinct roll values.
pub const ROLL_SPACE: u64 = 256;

/// Derive the roll for a bout from revealed entropy and the bout's play id.
///
/// Mixing in the play id gives every bout an independent roll even when
/// several bouts share a creation view.
pub fn compute_roll(entropy: &Digest, play_id: &Digest) -> u8 {
    let mut hasher = Sha256::new();
    hasher.update(entropy.as_ref());
    hasher.update(play_id.as_ref());
    hasher.update(b"roll"); // Domain separator
    let digest = hasher.finalize();
    modulo(digest.as_ref(), ROLL_SPACE) as u8
}

/// Whether a roll wins: strictly above the threshold, an even 128-of-256 split.
pub fn is_winning_roll(roll: u8) -> bool {
    roll > ROLL_WIN_THRESHOLD
}
