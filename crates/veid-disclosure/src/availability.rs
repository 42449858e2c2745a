//! # Claim Availability Validator
//!
//! Policy gate run for every requested claim before any proof is built.
//!
//! | Level    | Tier required        | Claims |
//! |----------|----------------------|--------|
//! | Basic    | anything but Unverified | human, email, SMS, domain verified |
//! | Standard | Standard or Premium  | age tiers, country resident, biometric, trust score |
//!
//! `TrustScoreAbove` additionally needs a stored score, and
//! `CountryResident` a verified residency country. A suspended or revoked
//! identity can make no claim at all.

use veid_scoring::IdentityScore;

use crate::claims::ClaimType;
use crate::error::DisclosureError;
use crate::identity::IdentityRecord;

/// Check that `record` may make `claim`.
pub fn validate_claim_availability(
    record: &IdentityRecord,
    claim: ClaimType,
    score: Option<&IdentityScore>,
) -> Result<(), DisclosureError> {
    if !record.is_active() {
        return Err(DisclosureError::ClaimNotAvailable {
            claim,
            reason: "identity is not active".into(),
        });
    }
    if !record.tier.satisfies(claim.min_level()) {
        return Err(DisclosureError::InsufficientVerificationLevel {
            claim,
            tier: record.tier,
        });
    }
    match claim {
        ClaimType::TrustScoreAbove if score.is_none() => Err(DisclosureError::ClaimNotAvailable {
            claim,
            reason: "no identity score on record".into(),
        }),
        ClaimType::CountryResident if record.residency_country.is_none() => {
            Err(DisclosureError::ClaimNotAvailable {
                claim,
                reason: "no verified residency country".into(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityStatus, IdentityTier};
    use veid_core::{AccountAddress, CountryCode, Digest32, Timestamp};

    fn record(tier: IdentityTier) -> IdentityRecord {
        IdentityRecord::new(
            AccountAddress::new("veid1alice").unwrap(),
            tier,
            Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        )
    }

    fn score() -> IdentityScore {
        IdentityScore {
            account: AccountAddress::new("veid1alice").unwrap(),
            score: 80,
            passed: true,
            model_version: "veid-composite-v1".into(),
            input_hash: Digest32::new([0; 32]),
            reason_codes: vec![],
            block_height: 1,
            computed_at: Timestamp::from_epoch_secs(1_700_000_000).unwrap(),
        }
    }

    #[test]
    fn basic_tier_gets_level_one_claims_only() {
        let r = record(IdentityTier::Basic);
        validate_claim_availability(&r, ClaimType::EmailVerified, None).unwrap();
        validate_claim_availability(&r, ClaimType::HumanVerified, None).unwrap();
        assert!(matches!(
            validate_claim_availability(&r, ClaimType::AgeOver18, None),
            Err(DisclosureError::InsufficientVerificationLevel { .. })
        ));
    }

    #[test]
    fn unverified_tier_gets_nothing() {
        let r = record(IdentityTier::Unverified);
        for claim in ClaimType::ALL {
            assert!(validate_claim_availability(&r, claim, Some(&score())).is_err(), "{claim}");
        }
    }

    #[test]
    fn score_claim_needs_a_stored_score() {
        let r = record(IdentityTier::Standard);
        assert!(matches!(
            validate_claim_availability(&r, ClaimType::TrustScoreAbove, None),
            Err(DisclosureError::ClaimNotAvailable { .. })
        ));
        validate_claim_availability(&r, ClaimType::TrustScoreAbove, Some(&score())).unwrap();
    }

    #[test]
    fn residency_claim_needs_a_country() {
        let r = record(IdentityTier::Premium);
        assert!(validate_claim_availability(&r, ClaimType::CountryResident, None).is_err());
        let r = r.with_residency(CountryCode::new("DE").unwrap());
        validate_claim_availability(&r, ClaimType::CountryResident, None).unwrap();
    }

    #[test]
    fn inactive_identity_is_refused() {
        let mut r = record(IdentityTier::Premium);
        r.status = IdentityStatus::Suspended;
        assert!(matches!(
            validate_claim_availability(&r, ClaimType::HumanVerified, None),
            Err(DisclosureError::ClaimNotAvailable { .. })
        ));
    }
}
