//! # Proof Verifier
//!
//! Checks a [`SelectiveDisclosureProof`] end to end. Verification never
//! fails with an error: every outcome is a [`ProofVerificationResult`], so
//! relying parties can audit rejections without special handling.
//!
//! Stages, short-circuiting on the first failure:
//!
//! 1. structure: proof id, scheme, metadata encoding, claim parameters;
//! 2. expiry against the block time;
//! 3. revocation by proof id;
//! 4. commitment hash recomputed from the disclosed claims and salt;
//! 5. bundle: canonical bytes, version, claim coverage, binding;
//! 6. every entry, dispatched on its claim. One failing entry fails the
//!    whole proof.

use std::collections::BTreeSet;

use metrics::counter;
use serde::{Deserialize, Serialize};
use veid_core::encoding::decode_canonical_hex;
use veid_core::{sha256_digest, AccountAddress, BlockContext, CanonicalBytes, Digest32, Timestamp};
use veid_crypto::{commit_canonical, ct_eq};
use veid_zkp::VerifyError;

use crate::claims::{ClaimParameters, ClaimType};
use crate::engine::DisclosureEngine;
use crate::error::DisclosureError;
use crate::generator::{country_labels, proof_id, DISCLOSED_CLAIMS_DOMAIN};
use crate::lookup::RevocationRegistry;
use crate::proof::{
    compute_binding, BindingContext, ClaimProof, ClaimProofEntry, SelectiveDisclosureProof,
    SelectiveDisclosureProofBundle,
};

/// Verification metrics, labelled by `valid`.
pub const METRIC_PROOFS_VERIFIED: &str = "veid_proofs_verified_total";

/// Outcome of verifying one proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofVerificationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub verified_claims: Vec<ClaimType>,
    pub verifier: AccountAddress,
    pub verified_at: Timestamp,
    pub proof_id: Digest32,
    /// SHA-256 of the canonical proof, for audit logs. Set on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_hash: Option<Digest32>,
}

fn invalid(msg: impl Into<String>) -> DisclosureError {
    DisclosureError::InvalidProof(msg.into())
}

fn entry_failure(claim: ClaimType, err: VerifyError) -> DisclosureError {
    match err {
        VerifyError::UnsupportedScheme(s) => DisclosureError::InvalidProofScheme(s),
        other => invalid(format!("{claim}: {other}")),
    }
}

impl DisclosureEngine {
    /// Verify `proof` at `ctx` against the parameters recorded in its
    /// metadata.
    pub fn verify_proof(
        &self,
        ctx: &BlockContext,
        revocations: &dyn RevocationRegistry,
        proof: &SelectiveDisclosureProof,
        verifier: &AccountAddress,
    ) -> ProofVerificationResult {
        self.verify_with(ctx, revocations, proof, verifier, None)
    }

    /// Verify `proof` against bounds and sets the relying party supplies.
    ///
    /// A residency parameter without an allowed set or country falls back
    /// to the set recorded in the proof.
    pub fn verify_proof_with_params(
        &self,
        ctx: &BlockContext,
        revocations: &dyn RevocationRegistry,
        proof: &SelectiveDisclosureProof,
        verifier: &AccountAddress,
        expected: &ClaimParameters,
    ) -> ProofVerificationResult {
        self.verify_with(ctx, revocations, proof, verifier, Some(expected))
    }

    fn verify_with(
        &self,
        ctx: &BlockContext,
        revocations: &dyn RevocationRegistry,
        proof: &SelectiveDisclosureProof,
        verifier: &AccountAddress,
        expected: Option<&ClaimParameters>,
    ) -> ProofVerificationResult {
        let outcome = self
            .check_proof(ctx, revocations, proof, expected)
            .and_then(|claims| {
                let hash = CanonicalBytes::new(proof)
                    .map(|b| sha256_digest(&b))
                    .map_err(|e| invalid(e.to_string()))?;
                Ok((claims, hash))
            });

        let result = match outcome {
            Ok((claims, hash)) => {
                tracing::debug!(proof_id = %proof.proof_id, %verifier, "proof verified");
                ProofVerificationResult {
                    is_valid: true,
                    error: None,
                    verified_claims: claims,
                    verifier: verifier.clone(),
                    verified_at: ctx.time,
                    proof_id: proof.proof_id,
                    proof_hash: Some(hash),
                }
            }
            Err(err) => {
                tracing::warn!(
                    proof_id = %proof.proof_id,
                    %verifier,
                    reason = err.telemetry_reason(),
                    "proof rejected"
                );
                ProofVerificationResult {
                    is_valid: false,
                    error: Some(err.to_string()),
                    verified_claims: Vec::new(),
                    verifier: verifier.clone(),
                    verified_at: ctx.time,
                    proof_id: proof.proof_id,
                    proof_hash: None,
                }
            }
        };
        let valid = if result.is_valid { "true" } else { "false" };
        counter!(METRIC_PROOFS_VERIFIED, "valid" => valid).increment(1);
        result
    }

    fn check_proof(
        &self,
        ctx: &BlockContext,
        revocations: &dyn RevocationRegistry,
        proof: &SelectiveDisclosureProof,
        expected: Option<&ClaimParameters>,
    ) -> Result<Vec<ClaimType>, DisclosureError> {
        // (1) structure
        if !self.backend().supports(proof.scheme) {
            return Err(DisclosureError::InvalidProofScheme(proof.scheme));
        }
        if proof.claim_types.is_empty() {
            return Err(invalid("proof names no claims"));
        }
        if proof_id(&proof.request_id, &proof.subject, &proof.nonce) != proof.proof_id {
            return Err(invalid("proof id does not match request, subject and nonce"));
        }
        if proof.valid_until <= proof.created_at {
            return Err(invalid("validity window is empty"));
        }
        if let Some(extra) = proof
            .disclosed_claims
            .keys()
            .find(|c| !proof.claim_types.contains(c))
        {
            return Err(invalid(format!("disclosed claim {extra} is not proven")));
        }
        let salt = decode_canonical_hex(&proof.metadata.commitment_salt)
            .map_err(|e| invalid(format!("commitment salt: {e}")))?;
        let recorded: ClaimParameters = serde_json::from_str(&proof.metadata.claim_parameters)
            .map_err(|e| invalid(format!("claim parameters: {e}")))?;
        let canonical = CanonicalBytes::new(&recorded).map_err(|e| invalid(e.to_string()))?;
        if canonical.as_bytes() != proof.metadata.claim_parameters.as_bytes() {
            return Err(invalid("claim parameters are not canonical"));
        }
        recorded
            .validate_for(&proof.claim_types)
            .map_err(|e| invalid(e.to_string()))?;

        // (2) expiry
        if ctx.time >= proof.valid_until {
            return Err(DisclosureError::ProofExpired);
        }

        // (3) revocation
        if revocations.is_revoked(&proof.proof_id) {
            return Err(invalid("proof has been revoked"));
        }

        // (4) commitment hash
        let disclosed = CanonicalBytes::new(&proof.disclosed_claims)
            .map_err(|e| invalid(format!("disclosed claims: {e}")))?;
        let recomputed = commit_canonical(DISCLOSED_CLAIMS_DOMAIN, &disclosed, &salt);
        if !ct_eq(&recomputed, &proof.commitment_hash) {
            return Err(invalid("commitment hash mismatch"));
        }

        // (5) bundle
        let bundle: SelectiveDisclosureProofBundle = serde_json::from_slice(&proof.proof_value)
            .map_err(|e| invalid(format!("proof bundle: {e}")))?;
        let reencoded = CanonicalBytes::new(&bundle).map_err(|e| invalid(e.to_string()))?;
        if reencoded.as_bytes() != proof.proof_value.as_slice() {
            return Err(invalid("proof bundle is not canonically encoded"));
        }
        if bundle.version != self.config().bundle_version {
            return Err(invalid(format!(
                "unsupported bundle version {}",
                bundle.version
            )));
        }
        if bundle.entries.is_empty() {
            return Err(invalid("proof bundle is empty"));
        }
        let covered: Vec<ClaimType> = bundle.entries.iter().map(|e| e.claim_type).collect();
        let expected_order: Vec<ClaimType> = proof.claim_types.iter().copied().collect();
        if covered != expected_order {
            return Err(invalid(
                "bundle entries do not cover exactly the proof's claims",
            ));
        }
        let binding = compute_binding(
            bundle.version,
            &bundle.entries,
            BindingContext {
                proof_id: &proof.proof_id,
                subject: &proof.subject,
                scheme: proof.scheme,
                commitment_hash: &proof.commitment_hash,
                claim_parameters: &proof.metadata.claim_parameters,
                valid_until: proof.valid_until,
            },
        )
        .map_err(|e| invalid(e.to_string()))?;
        if !ct_eq(&binding, &bundle.binding) {
            return Err(invalid("bundle binding mismatch"));
        }

        // (6) entries
        let params = expected.unwrap_or(&recorded);
        for entry in &bundle.entries {
            self.check_entry(entry, params, &recorded)?;
        }
        Ok(expected_order)
    }

    fn check_entry(
        &self,
        entry: &ClaimProofEntry,
        params: &ClaimParameters,
        recorded: &ClaimParameters,
    ) -> Result<(), DisclosureError> {
        let claim = entry.claim_type;
        if entry.kind != entry.proof.kind() || entry.kind != claim.proof_kind() {
            return Err(invalid(format!("{claim}: proof kind mismatch")));
        }
        if entry.commitment != entry.proof.commitment_bytes() {
            return Err(invalid(format!("{claim}: entry commitment mismatch")));
        }
        let domain = claim.proof_domain();
        let backend = self.backend();

        let outcome = match (claim, &entry.proof) {
            (
                ClaimType::AgeOver18 | ClaimType::AgeOver21 | ClaimType::AgeOver25,
                ClaimProof::Range(p),
            ) => {
                let bound = claim
                    .age_lower_bound()
                    .ok_or_else(|| invalid(format!("{claim} has no age bound")))?;
                backend.verify_range(&domain, p, bound)
            }
            (ClaimType::TrustScoreAbove, ClaimProof::Range(p)) => {
                let threshold = params
                    .score_threshold()
                    .ok_or_else(|| invalid(format!("{claim}: no score threshold")))?;
                backend.verify_range(&domain, p, u64::from(threshold))
            }
            (ClaimType::CountryResident, ClaimProof::SetMembership(p)) => {
                let mut allowed = params.effective_allowed(None);
                if allowed.is_empty() {
                    allowed = recorded.effective_allowed(None);
                }
                if allowed.is_empty() {
                    return Err(invalid(format!("{claim}: no allowed country set")));
                }
                backend.verify_membership(&domain, p, &country_labels(&allowed))
            }
            (
                ClaimType::HumanVerified
                | ClaimType::EmailVerified
                | ClaimType::SmsVerified
                | ClaimType::DomainVerified
                | ClaimType::BiometricVerified,
                ClaimProof::PedersenKnowledge(p),
            ) => backend.verify_knowledge(&domain, p),
            _ => return Err(invalid(format!("{claim}: unexpected proof payload"))),
        };
        outcome.map_err(|e| entry_failure(claim, e))
    }
}

/// Claims a result vouches for, as a set.
pub fn verified_claim_set(result: &ProofVerificationResult) -> BTreeSet<ClaimType> {
    if result.is_valid {
        result.verified_claims.iter().copied().collect()
    } else {
        BTreeSet::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::generator::ProofOptions;
    use crate::identity::{IdentityRecord, IdentityTier};
    use crate::lookup::NoRevocations;
    use crate::testutil::*;
    use proptest::prelude::*;

    fn claim_set() -> impl Strategy<Value = BTreeSet<ClaimType>> {
        prop::collection::btree_set(
            prop::sample::select(vec![
                ClaimType::AgeOver18,
                ClaimType::AgeOver21,
                ClaimType::AgeOver25,
                ClaimType::CountryResident,
                ClaimType::HumanVerified,
                ClaimType::EmailVerified,
                ClaimType::SmsVerified,
                ClaimType::DomainVerified,
                ClaimType::BiometricVerified,
            ]),
            1..5,
        )
    }

    proptest! {
        #[test]
        fn available_claims_generate_and_verify(
            name in "[a-z0-9]{1,20}",
            created in 1_500_000_000i64..1_700_000_000,
            claims in claim_set(),
        ) {
            let subject = addr(&format!("veid1{name}"));
            let (engine, mut state) = setup();
            let record = IdentityRecord::new(
                subject.clone(),
                IdentityTier::Premium,
                Timestamp::from_epoch_secs(created).unwrap(),
            )
            .with_residency(cc("DE"));
            let age = record.derived_age();
            state.records.insert(subject.clone(), record);

            let list: Vec<_> = claims.iter().copied().collect();
            let req = request(&engine, subject.as_str(), &list, ClaimParameters::default());
            let outcome = engine.generate_proof(&ctx(), &state, &subject, &req, &ProofOptions::default());

            let max_bound = claims.iter().filter_map(|c| c.age_lower_bound()).max().unwrap_or(0);
            if age >= max_bound {
                let proof = outcome.unwrap();
                let result = engine.verify_proof(&ctx(), &NoRevocations, &proof, &addr("veid1bank"));
                prop_assert!(result.is_valid, "{:?}", result.error);
                prop_assert_eq!(result.verified_claims, list);
            } else {
                let is_refusal = matches!(outcome, Err(DisclosureError::ClaimNotAvailable { .. }));
                prop_assert!(is_refusal);
            }
        }
    }
}
