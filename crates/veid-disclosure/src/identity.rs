//! # Identity Records
//!
//! The read-only identity state both engines consume. Records are owned by
//! the host's identity module; this crate only reads them through
//! [`IdentityLookup`](crate::IdentityLookup).

use std::fmt;

use serde::{Deserialize, Serialize};
use veid_core::{domain_hash, AccountAddress, CountryCode, Timestamp};

use crate::claims::VerificationLevel;

const AGE_DERIVE_DOMAIN: &str = "veid:age:derive";

/// Verification tier of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityTier {
    Unverified,
    Basic,
    Standard,
    Premium,
}

impl IdentityTier {
    /// Whether this tier reaches `level`.
    pub fn satisfies(&self, level: VerificationLevel) -> bool {
        match level {
            VerificationLevel::Basic => *self != Self::Unverified,
            VerificationLevel::Standard => matches!(self, Self::Standard | Self::Premium),
        }
    }
}

impl fmt::Display for IdentityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unverified => "unverified",
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Premium => "premium",
        })
    }
}

/// Lifecycle status of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    Active,
    Suspended,
    Revoked,
}

/// Identity state read by scoring and disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub address: AccountAddress,
    pub tier: IdentityTier,
    pub status: IdentityStatus,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residency_country: Option<CountryCode>,
}

impl IdentityRecord {
    /// An active record with no residency.
    pub fn new(address: AccountAddress, tier: IdentityTier, created_at: Timestamp) -> Self {
        Self {
            address,
            tier,
            status: IdentityStatus::Active,
            created_at,
            residency_country: None,
        }
    }

    /// Set the verified residency country.
    pub fn with_residency(mut self, country: CountryCode) -> Self {
        self.residency_country = Some(country);
        self
    }

    /// Whether the identity may make claims at all.
    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }

    /// Age in years, derived from address and creation time.
    ///
    /// The chain never stores a birth date; the attested age is a
    /// deterministic function of the record, in `[18, 80]`.
    pub fn derived_age(&self) -> u64 {
        let digest = domain_hash(
            AGE_DERIVE_DOMAIN,
            &[
                self.address.as_bytes(),
                &self.created_at.epoch_secs().to_be_bytes(),
            ],
        );
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        18 + u64::from_be_bytes(head) % 63
    }
}
