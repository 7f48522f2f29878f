//! Deterministic fixtures for tests and simulations.
//!
//! Seeds are derived from a fixed network keypair so every run observes the
//! same entropy schedule, keeping resolution outcomes reproducible.

use crate::auth::Authorizer;
use crate::custody::{Custody, CustodyError};
use crate::state::Adb;
use commonware_consensus::{
    simplex::types::view_message, threshold_simplex::types::seed_namespace,
};
use commonware_cryptography::{
    bls12381::primitives::{
        group::Private,
        ops,
        variant::{MinSig, Variant},
    },
    ed25519::{PrivateKey, PublicKey},
    sha256::Sha256,
    PrivateKeyExt, Signer,
};
use commonware_runtime::{buffer::PoolRef, Clock, Metrics, Spawner, Storage};
use commonware_storage::{
    adb::{self, keyless},
    translator::EightCap,
};
use commonware_utils::{NZUsize, NZU64};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;
use tombola_types::{execution::Output, Seed, NAMESPACE};

/// Creates a master keypair for BLS signatures used in consensus
pub fn create_network_keypair() -> (Private, <MinSig as Variant>::Public) {
    let mut rng = StdRng::seed_from_u64(0);
    ops::keypair::<_, MinSig>(&mut rng)
}

/// Creates an account keypair for Ed25519 signatures used by players
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::from_rng(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// Creates a test seed for consensus
pub fn create_seed(network_secret: &Private, view: u64) -> Seed {
    let seed_namespace = seed_namespace(NAMESPACE);
    let message = view_message(view);
    Seed::new(
        view,
        ops::sign_message::<MinSig>(network_secret, Some(&seed_namespace), &message),
    )
}

/// In-memory custody ledger tracking external balances and contract escrow.
///
/// `move_in` debits the player and grows escrow; `move_out` pays escrow back
/// out. The sum of all balances plus escrow is constant, which is what the
/// fund-conservation tests assert against.
#[derive(Default)]
pub struct Bank {
    balances: HashMap<PublicKey, u64>,
    escrow: u64,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund(&mut self, who: PublicKey, amount: u64) {
        *self.balances.entry(who).or_default() += amount;
    }

    /// Seed the contract-held escrow with a house float, the way an operator
    /// funds the contract before opening it to bettors. Without it the first
    /// winning payout (stake plus award) could not be covered.
    pub fn fund_escrow(&mut self, amount: u64) {
        self.escrow += amount;
    }

    pub fn balance(&self, who: &PublicKey) -> u64 {
        self.balances.get(who).copied().unwrap_or(0)
    }

    pub fn escrow(&self) -> u64 {
        self.escrow
    }
}

impl Custody for Bank {
    fn move_in(&mut self, from: &PublicKey, amount: u64) -> Result<(), CustodyError> {
        let balance = self.balances.entry(from.clone()).or_default();
        if *balance < amount {
            return Err(CustodyError::InsufficientBalance {
                have: *balance,
                need: amount,
            });
        }
        *balance -= amount;
        self.escrow += amount;
        Ok(())
    }

    fn move_out(&mut self, to: &PublicKey, amount: u64) -> Result<(), CustodyError> {
        if self.escrow < amount {
            return Err(CustodyError::InsufficientEscrow {
                have: self.escrow,
                need: amount,
            });
        }
        self.escrow -= amount;
        *self.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }
}

/// Authorizer admitting every caller, for tests not about governance.
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_authorized(&self, _caller: &PublicKey) -> bool {
        true
    }
}

/// Creates state and events databases for testing
pub async fn create_adbs<E: Spawner + Metrics + Storage + Clock>(
    context: &E,
) -> (Adb<E, EightCap>, keyless::Keyless<E, Output, Sha256>) {
    let buffer_pool = PoolRef::new(NZUsize!(1024), NZUsize!(1024));

    let state = Adb::init(
        context.with_label("state"),
        adb::any::variable::Config {
            mmr_journal_partition: String::from("state-mmr-journal"),
            mmr_metadata_partition: String::from("state-mmr-metadata"),
            mmr_items_per_blob: NZU64!(1024),
            mmr_write_buffer: NZUsize!(1024),
            log_journal_partition: String::from("state-log-journal"),
            log_items_per_section: NZU64!(1024),
            log_write_buffer: NZUsize!(1024),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("state-locations-journal"),
            locations_items_per_blob: NZU64!(1024),
            translator: EightCap,
            thread_pool: None,
            buffer_pool: buffer_pool.clone(),
        },
    )
    .await
    .expect("Failed to initialize state ADB");

    let events = keyless::Keyless::<_, Output, Sha256>::init(
        context.with_label("events"),
        keyless::Config {
            mmr_journal_partition: String::from("events-mmr-journal"),
            mmr_metadata_partition: String::from("events-mmr-metadata"),
            mmr_items_per_blob: NZU64!(1024),
            mmr_write_buffer: NZUsize!(1024),
            log_journal_partition: String::from("events-log-journal"),
            log_items_per_section: NZU64!(1024),
            log_write_buffer: NZUsize!(1024),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("events-locations-journal"),
            locations_items_per_blob: NZU64!(1024),
            locations_write_buffer: NZUsize!(1024),
            thread_pool: None,
            buffer_pool,
        },
    )
    .await
    .expect("Failed to initialize events Keyless");

    (state, events)
}
