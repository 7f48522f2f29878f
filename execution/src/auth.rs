//! Governance authorization boundary.

use commonware_cryptography::ed25519::PublicKey;

/// Capability check consulted before limit governance changes.
pub trait Authorizer {
    fn is_authorized(&self, caller: &PublicKey) -> bool;
}

/// The single governance capability: one configured admin key.
#[derive(Clone, Debug)]
pub struct GovernanceKey {
    admin: PublicKey,
}

impl GovernanceKey {
    pub fn new(admin: PublicKey) -> Self {
        Self { admin }
    }
}

impl Authorizer for GovernanceKey {
    fn is_authorized(&self, caller: &PublicKey) -> bool {
        *caller == self.admin
    }
}
