//! # Collaborator Interfaces
//!
//! The engine owns no state. Identity records, stored scores and the
//! revocation list are read through these traits, implemented by the host's
//! keeper (see [`StoreLookups`](crate::keeper::StoreLookups)) or by test
//! fixtures.

use std::collections::{BTreeMap, BTreeSet};

use veid_core::{AccountAddress, Digest32};
use veid_scoring::IdentityScore;

use crate::identity::IdentityRecord;

/// Read access to identity records.
pub trait IdentityLookup {
    /// The subject's record, if one exists.
    fn get_identity_record(&self, subject: &AccountAddress) -> Option<IdentityRecord>;
}

/// Read access to stored composite scores.
pub trait ScoreLookup {
    /// The subject's latest score, if one exists.
    fn get_identity_score(&self, subject: &AccountAddress) -> Option<IdentityScore>;
}

/// Read access to revoked proof identifiers.
pub trait RevocationRegistry {
    /// Whether `proof_id` has been revoked.
    fn is_revoked(&self, proof_id: &Digest32) -> bool;
}

impl IdentityLookup for BTreeMap<AccountAddress, IdentityRecord> {
    fn get_identity_record(&self, subject: &AccountAddress) -> Option<IdentityRecord> {
        self.get(subject).cloned()
    }
}

impl ScoreLookup for BTreeMap<AccountAddress, IdentityScore> {
    fn get_identity_score(&self, subject: &AccountAddress) -> Option<IdentityScore> {
        self.get(subject).cloned()
    }
}

impl RevocationRegistry for BTreeSet<Digest32> {
    fn is_revoked(&self, proof_id: &Digest32) -> bool {
        self.contains(proof_id)
    }
}

/// A registry with nothing revoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRevocations;

impl RevocationRegistry for NoRevocations {
    fn is_revoked(&self, _proof_id: &Digest32) -> bool {
        false
    }
}
