//! Tombola execution layer.
//!
//! This crate contains the deterministic wagering-ledger logic (`Layer`): player
//! registration, bet placement, delayed-reveal resolution, payout settlement,
//! and bet-limit governance.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution.
//! - Do not use non-deterministic randomness; all unpredictability is supplied
//!   by the injected [`oracle::EntropyOracle`] capability, which reveals a
//!   view's entropy only after that view's consensus round has completed.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Storage / recovery invariants
//! The execution pipeline assumes event logs may be committed ahead of state.
//! Recovery logic in `state_transition` must be safe to re-run and must
//! converge to the same output.
//!
//! The primary entrypoint is [`Layer`].
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! # #[cfg(feature = "mocks")]
//! # {
//! use tombola_execution::state_transition::execute_state_transition;
//! use tombola_execution::mocks::{create_network_keypair, create_seed, AllowAll, Bank};
//! use tombola_execution::oracle::SeedEntropy;
//!
//! # async fn example(
//! #     state: &mut /* Adb<...> */ (),
//! #     events: &mut /* keyless::Keyless<...> */ (),
//! # ) -> anyhow::Result<()> {
//! // 1) Load or initialize `state` and `events` storage.
//! // 2) Execute the next block (height must be exactly `state_height + 1`).
//! // For tests, you can derive a seed using the mocks helper (requires `mocks` feature).
//! let (network_secret, _network_public) = create_network_keypair();
//! let seed = create_seed(&network_secret, 1);
//! let mut oracle = SeedEntropy::new();
//! oracle.record(seed.clone());
//! let mut custody = Bank::new();
//! let _result = execute_state_transition(
//!     state,
//!     events,
//!     /* height */ 1,
//!     seed,
//!     &oracle,
//!     &mut custody,
//!     &AllowAll,
//!     /* transactions */ vec![],
//! )
//! .await?;
//! # Ok(())
//! # }
//! # }
//! ```

pub mod auth;
pub mod custody;
pub mod oracle;
pub mod query;
pub mod roll;
pub mod state_transition;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


mod layer;

mod state;

pub use auth::{Authorizer, GovernanceKey};
pub use custody::{Custody, CustodyError};
pub use layer::{derive_play_id, Layer, WagerError};
pub use oracle::{EntropyError, EntropyOracle, SeedEntropy};
pub use query::{
    decode_play_id, decode_player, query_award, query_bout_information, query_limit_settings,
    query_player_information, query_random_number, BoutInformation, PlayerInformation, QueryError,
};
pub use roll::{compute_roll, is_winning_roll, ROLL_SPACE};
pub use state::{Adb, PrepareError, State, Status};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
