//! Custody collaborator boundary.
//!
//! The ledger never holds token balances itself; stake moves through an
//! external custody service. Both directions can fail, and a failure must
//! abort the enclosing instruction before any ledger mutation is staged.
//! Implementations embedded in a block pipeline are expected to stage
//! transfers alongside the layer's pending writes and make them durable when
//! the layer commits, so crash recovery can re-run a block without double
//! moving funds.

use commonware_cryptography::ed25519::PublicKey;

/// External token-custody service moving value between player accounts and
/// contract-held escrow.
pub trait Custody {
    /// Move `amount` from the player's external balance into escrow.
    fn move_in(&mut self, from: &PublicKey, amount: u64) -> Result<(), CustodyError>;

    /// Pay `amount` from escrow out to the player.
    fn move_out(&mut self, to: &PublicKey, amount: u64) -> Result<(), CustodyError>;
}

/// Failures reported by the custody collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// The player's external balance cannot cover the requested stake.
    InsufficientBalance { have: u64, need: u64 },
    /// The player has not granted the ledger a sufficient spending allowance.
    InsufficientAllowance { allowed: u64, need: u64 },
    /// Escrow cannot cover the requested payout.
    InsufficientEscrow { have: u64, need: u64 },
}

impl std::fmt::Display for CustodyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientBalance { have, need } => {
                write!(f, "insufficient balance (have={have}, need={need})")
            }
            Self::InsufficientAllowance { allowed, need } => {
                write!(f, "insufficient allowance (allowed={allowed}, need={need})")
            }
            Self::InsufficientEscrow { have, need } => {
                write!(f, "insufficient escrow (have={have}, need={need})")
            }
        }
    }
}

impl std::error::Error for CustodyError {}
