//! Delayed-reveal entropy capability.
//!
//! The resolution engine never touches a wall clock or a local RNG; every bit
//! of unpredictability is supplied through [`EntropyOracle`]. Implementations
//! must guarantee the commit-delay-reveal property: entropy for a view is
//! unknowable before that view's consensus round completes and stable forever
//! after.

use commonware_codec::Encode;
use commonware_consensus::Viewable;
use commonware_cryptography::sha256::{Digest, Sha256};
use commonware_cryptography::Hasher;
use std::collections::BTreeMap;
use tombola_types::Seed;

/// Capability supplying unpredictable-until-reveal entropy tied to consensus
/// views.
pub trait EntropyOracle {
    /// Entropy for `view`, available only once a later round has completed.
    fn entropy_for(&self, view: u64) -> Result<Digest, EntropyError>;
}

/// Errors surfaced by entropy lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntropyError {
    /// No round after `view` has completed yet, so its entropy is still
    /// unpredictable. Callers retry after more views elapse.
    Unavailable { view: u64 },
}

impl std::fmt::Display for EntropyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { view } => write!(f, "entropy unavailable for view {view}"),
        }
    }
}

impl std::error::Error for EntropyError {}

/// Entropy oracle backed by recorded consensus seeds.
///
/// A seed is a threshold signature over its view: no party can compute it
/// before the view's round completes, and it is reproducible by everyone
/// afterwards. Entropy for view `v` is revealed only once a seed for a view
/// strictly greater than `v` has been recorded, which delays resolution by at
/// least one full round past bet placement.
#[derive(Default)]
pub struct SeedEntropy {
    seeds: BTreeMap<u64, Seed>,
    latest: u64,
}

impl SeedEntropy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the seed observed for an executed view.
    pub fn record(&mut self, seed: Seed) {
        let view = seed.view();
        self.latest = self.latest.max(view);
        self.seeds.insert(view, seed);
    }

    /// Highest view for which a seed has been recorded.
    pub fn latest(&self) -> u64 {
        self.latest
    }
}

impl EntropyOracle for SeedEntropy {
    fn entropy_for(&self, view: u64) -> Result<Digest, EntropyError> {
        // The seed for `view` counts as revealed only once a later round has
        // been observed.
        if view >= self.latest {
            return Err(EntropyError::Unavailable { view });
        }
        let Some(seed) = self.seeds.get(&view) else {
            return Err(EntropyError::Unavailable { view });
        };

        let mut hasher = Sha256::new();
        hasher.update(seed.encode().as_ref());
        hasher.update(b"entropy"); // Domain separator
        Ok(hasher.finalize())
    }
}
