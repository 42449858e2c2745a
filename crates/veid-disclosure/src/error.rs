//! # Disclosure Errors
//!
//! Every failure of request creation and proof generation is one of these
//! typed values. Verification never returns them directly: the verifier
//! folds them into a [`ProofVerificationResult`](crate::ProofVerificationResult)
//! so relying parties can audit a rejection without handling an error path.

use thiserror::Error;
use veid_core::{AccountAddress, StoreError};
use veid_scoring::ScoringError;
use veid_zkp::ProofScheme;

use crate::claims::ClaimType;
use crate::identity::IdentityTier;

/// Error raised by the selective-disclosure engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisclosureError {
    /// The request is malformed.
    #[error("invalid proof request: {0}")]
    InvalidProofRequest(String),

    /// A claim type is unknown or its parameters are invalid.
    #[error("invalid claim type: {0}")]
    InvalidClaimType(String),

    /// The subject's tier is below the claim's minimum level.
    #[error("claim {claim} requires a higher verification level than tier {tier}")]
    InsufficientVerificationLevel {
        /// Requested claim.
        claim: ClaimType,
        /// Subject's current tier.
        tier: IdentityTier,
    },

    /// The subject cannot truthfully make the claim right now.
    #[error("claim {claim} not available: {reason}")]
    ClaimNotAvailable {
        /// Requested claim.
        claim: ClaimType,
        /// Why the claim was refused.
        reason: String,
    },

    /// The request's expiry has passed.
    #[error("proof request expired")]
    ProofRequestExpired,

    /// The proof's validity window has passed.
    #[error("proof expired")]
    ProofExpired,

    /// The proof failed a structural or cryptographic check.
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// The proof scheme is not served by the configured backend.
    #[error("invalid proof scheme: {0}")]
    InvalidProofScheme(ProofScheme),

    /// Internal construction error, e.g. malformed parameters.
    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),

    /// No identity record exists for the subject.
    #[error("identity record not found for {0}")]
    IdentityRecordNotFound(AccountAddress),

    /// Caller is not the subject or requester the operation requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl DisclosureError {
    /// Stable low-cardinality label for metrics.
    pub fn telemetry_reason(&self) -> &'static str {
        match self {
            Self::InvalidProofRequest(_) => "invalid_proof_request",
            Self::InvalidClaimType(_) => "invalid_claim_type",
            Self::InsufficientVerificationLevel { .. } => "insufficient_verification_level",
            Self::ClaimNotAvailable { .. } => "claim_not_available",
            Self::ProofRequestExpired => "proof_request_expired",
            Self::ProofExpired => "proof_expired",
            Self::InvalidProof(_) => "invalid_proof",
            Self::InvalidProofScheme(_) => "invalid_proof_scheme",
            Self::ProofGenerationFailed(_) => "proof_generation_failed",
            Self::IdentityRecordNotFound(_) => "identity_record_not_found",
            Self::Unauthorized(_) => "unauthorized",
        }
    }
}

/// Error raised by the keeper: an engine failure or a store codec failure.
#[derive(Error, Debug)]
pub enum KeeperError {
    /// The engine refused the operation.
    #[error(transparent)]
    Disclosure(#[from] DisclosureError),

    /// A persisted entity could not be encoded or decoded.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// Score computation or persistence failed.
    #[error("scoring: {0}")]
    Scoring(#[from] ScoringError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_claim_and_tier() {
        let err = DisclosureError::InsufficientVerificationLevel {
            claim: ClaimType::AgeOver18,
            tier: IdentityTier::Basic,
        };
        assert_eq!(
            err.to_string(),
            "claim age_over_18 requires a higher verification level than tier basic"
        );
    }

    #[test]
    fn telemetry_reasons_are_snake_case() {
        let errs = [
            DisclosureError::ProofExpired,
            DisclosureError::InvalidProofScheme(ProofScheme::Groth16),
            DisclosureError::Unauthorized("x".into()),
        ];
        for e in errs {
            let r = e.telemetry_reason();
            assert!(r.bytes().all(|b| b.is_ascii_lowercase() || b == b'_'), "{r}");
        }
    }
}
