//! # Proof Generator
//!
//! Builds a [`SelectiveDisclosureProof`] for a request. Preconditions are
//! checked in order, each failing with its own typed error:
//!
//! 1. the backend serves the requested scheme;
//! 2. the request is well formed and has not expired;
//! 3. the caller is the request's subject;
//! 4. the subject has an identity record that passes the availability
//!    policy for every requested claim.
//!
//! Each claim then gets its own entry, proved under a claim-specific
//! sub-nonce and sub-salt. A claim whose statement is false (age below the
//! tier, score below the threshold, country outside the allowed set) is
//! refused with `ClaimNotAvailable`; no proof of a false statement is ever
//! emitted. Generation is all-or-nothing: one refused claim refuses the
//! whole proof.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use metrics::counter;
use veid_core::{
    domain_hash, AccountAddress, BlockContext, CanonicalBytes, CountryCode, Digest32,
};
use veid_crypto::randomness::domains;
use veid_crypto::{
    commit_canonical, derive_claim_nonce, derive_claim_salt, RandomnessInputs, RandomnessResolver,
};
use veid_scoring::IdentityScore;
use veid_zkp::{ProofError, ProofScheme};

use crate::availability::validate_claim_availability;
use crate::claims::{ClaimParameters, ClaimType};
use crate::engine::DisclosureEngine;
use crate::error::DisclosureError;
use crate::identity::IdentityRecord;
use crate::lookup::{IdentityLookup, ScoreLookup};
use crate::proof::{
    BindingContext, ClaimProof, ClaimProofEntry, ProofMetadata, SelectiveDisclosureProof,
    SelectiveDisclosureProofBundle,
};
use crate::request::SelectiveDisclosureRequest;

pub(crate) const DISCLOSED_CLAIMS_DOMAIN: &str = "veid:sdr:disclosed_claims";
const PROOF_ID_DOMAIN: &str = "veid:sdr:proof_id";

/// Generation metrics.
pub const METRIC_PROOFS_GENERATED: &str = "veid_proofs_generated_total";
/// Refusal metrics, labelled by `reason`.
pub const METRIC_GENERATION_REFUSED: &str = "veid_proof_generation_refused_total";

/// Subject-chosen options for one proof.
#[derive(Debug, Clone, Default)]
pub struct ProofOptions {
    pub scheme: ProofScheme,
    /// Claims revealed in the clear, keyed by claim.
    pub disclosed_claims: BTreeMap<ClaimType, serde_json::Value>,
    pub randomness: RandomnessInputs,
}

/// `H("veid:sdr:proof_id" || request_id || subject || nonce)`.
pub fn proof_id(request_id: &Digest32, subject: &AccountAddress, nonce: &[u8]) -> Digest32 {
    domain_hash(
        PROOF_ID_DOMAIN,
        &[request_id.as_bytes(), subject.as_bytes(), nonce],
    )
}

pub(crate) fn knowledge_secret(claim: ClaimType, subject: &AccountAddress) -> Vec<u8> {
    format!("{claim}:{subject}").into_bytes()
}

pub(crate) fn canonical_string(value: &impl serde::Serialize) -> Result<String, DisclosureError> {
    let bytes = CanonicalBytes::new(value)
        .map_err(|e| DisclosureError::ProofGenerationFailed(e.to_string()))?;
    String::from_utf8(bytes.into_bytes())
        .map_err(|e| DisclosureError::ProofGenerationFailed(e.to_string()))
}

pub(crate) fn country_labels(set: &BTreeSet<CountryCode>) -> BTreeSet<String> {
    set.iter().map(|c| c.as_str().to_string()).collect()
}

/// Map a backend refusal onto the disclosure taxonomy.
pub(crate) fn refusal(claim: ClaimType, err: ProofError) -> DisclosureError {
    match err {
        ProofError::StatementFalse(reason) => DisclosureError::ClaimNotAvailable { claim, reason },
        ProofError::OutOfRange(reason) => {
            DisclosureError::ProofGenerationFailed(format!("{claim}: {reason}"))
        }
        ProofError::UnsupportedScheme(s) => DisclosureError::InvalidProofScheme(s),
    }
}

pub(crate) fn record_refusal(subject: &AccountAddress, err: &DisclosureError) {
    counter!(METRIC_GENERATION_REFUSED, "reason" => err.telemetry_reason()).increment(1);
    tracing::warn!(%subject, reason = err.telemetry_reason(), "proof generation refused");
}

impl DisclosureEngine {
    /// Generate a proof for `request` on behalf of `subject`.
    pub fn generate_proof<S>(
        &self,
        ctx: &BlockContext,
        state: &S,
        subject: &AccountAddress,
        request: &SelectiveDisclosureRequest,
        options: &ProofOptions,
    ) -> Result<SelectiveDisclosureProof, DisclosureError>
    where
        S: IdentityLookup + ScoreLookup + ?Sized,
    {
        match self.generate_inner(ctx, state, subject, request, options) {
            Ok(proof) => {
                counter!(METRIC_PROOFS_GENERATED).increment(1);
                tracing::debug!(
                    proof_id = %proof.proof_id,
                    request_id = %proof.request_id,
                    %subject,
                    claims = proof.claim_types.len(),
                    "selective disclosure proof generated"
                );
                Ok(proof)
            }
            Err(err) => {
                record_refusal(subject, &err);
                Err(err)
            }
        }
    }

    fn generate_inner<S>(
        &self,
        ctx: &BlockContext,
        state: &S,
        subject: &AccountAddress,
        request: &SelectiveDisclosureRequest,
        options: &ProofOptions,
    ) -> Result<SelectiveDisclosureProof, DisclosureError>
    where
        S: IdentityLookup + ScoreLookup + ?Sized,
    {
        if !self.backend().supports(options.scheme) {
            return Err(DisclosureError::InvalidProofScheme(options.scheme));
        }
        request.validate()?;
        if request.is_expired(ctx.time) {
            return Err(DisclosureError::ProofRequestExpired);
        }
        if &request.subject != subject {
            return Err(DisclosureError::Unauthorized(
                "only the request's subject may answer it".into(),
            ));
        }
        if request.validity_duration_secs > self.config().max_validity_secs {
            return Err(DisclosureError::InvalidProofRequest(format!(
                "validity duration exceeds {} seconds",
                self.config().max_validity_secs
            )));
        }
        let claims = &request.requested_claims;
        if let Some(extra) = options.disclosed_claims.keys().find(|c| !claims.contains(c)) {
            return Err(DisclosureError::InvalidProofRequest(format!(
                "disclosed claim {extra} was not requested"
            )));
        }

        let record = state
            .get_identity_record(subject)
            .ok_or_else(|| DisclosureError::IdentityRecordNotFound(subject.clone()))?;
        let score = state.get_identity_score(subject);
        for claim in claims {
            validate_claim_availability(&record, *claim, score.as_ref())?;
        }

        let disclosed = CanonicalBytes::new(&options.disclosed_claims)
            .map_err(|e| DisclosureError::ProofGenerationFailed(e.to_string()))?;

        // Nonce and proof id cover the scheme and the disclosed claims.
        let resolver = RandomnessResolver::for_block(ctx);
        let context: [&[u8]; 4] = [
            request.request_id.as_bytes(),
            subject.as_bytes(),
            options.scheme.as_str().as_bytes(),
            disclosed.as_bytes(),
        ];
        let nonce = resolver.resolve(
            options.randomness.nonce.as_deref(),
            domains::SDR_PROOF_NONCE,
            &context,
        );
        let salt = resolver.resolve(
            options.randomness.commitment_salt.as_deref(),
            domains::SDR_COMMITMENT_SALT,
            &context,
        );

        let commitment_hash = commit_canonical(DISCLOSED_CLAIMS_DOMAIN, &disclosed, &salt);

        let params = request
            .claim_parameters
            .effective(claims, record.residency_country.as_ref());
        let params_json = canonical_string(&params)?;

        let entries = claims
            .iter()
            .map(|claim| self.build_entry(*claim, &record, score.as_ref(), &params, &nonce, &salt))
            .collect::<Result<Vec<_>, _>>()?;

        let proof_id = proof_id(&request.request_id, subject, &nonce);
        let valid_until = Duration::try_seconds(request.validity_duration_secs)
            .and_then(|d| ctx.time.checked_add(d))
            .ok_or_else(|| {
                DisclosureError::ProofGenerationFailed("validity window out of range".into())
            })?;

        let bundle = SelectiveDisclosureProofBundle::assemble(
            self.config().bundle_version,
            entries,
            BindingContext {
                proof_id: &proof_id,
                subject,
                scheme: options.scheme,
                commitment_hash: &commitment_hash,
                claim_parameters: &params_json,
                valid_until,
            },
        )
        .map_err(|e| DisclosureError::ProofGenerationFailed(e.to_string()))?;
        let proof_value = CanonicalBytes::new(&bundle)
            .map_err(|e| DisclosureError::ProofGenerationFailed(e.to_string()))?
            .into_bytes();

        Ok(SelectiveDisclosureProof {
            proof_id,
            request_id: request.request_id,
            subject: subject.clone(),
            requester: request.requester.clone(),
            claim_types: claims.clone(),
            scheme: options.scheme,
            disclosed_claims: options.disclosed_claims.clone(),
            commitment_hash,
            proof_value,
            nonce,
            metadata: ProofMetadata {
                commitment_salt: hex::encode(&salt),
                claim_parameters: params_json,
            },
            created_at: ctx.time,
            valid_until,
        })
    }

    fn build_entry(
        &self,
        claim: ClaimType,
        record: &IdentityRecord,
        score: Option<&IdentityScore>,
        params: &ClaimParameters,
        nonce_base: &[u8],
        salt_base: &[u8],
    ) -> Result<ClaimProofEntry, DisclosureError> {
        let nonce = derive_claim_nonce(nonce_base, claim.as_str());
        let salt = derive_claim_salt(salt_base, claim.as_str());
        let domain = claim.proof_domain();
        let backend = self.backend();

        let proof = match claim {
            ClaimType::AgeOver18 | ClaimType::AgeOver21 | ClaimType::AgeOver25 => {
                let bound = claim.age_lower_bound().ok_or_else(|| {
                    DisclosureError::ProofGenerationFailed(format!("{claim} has no age bound"))
                })?;
                ClaimProof::Range(
                    backend
                        .prove_range(&domain, record.derived_age(), bound, &nonce, &salt)
                        .map_err(|e| refusal(claim, e))?,
                )
            }
            ClaimType::TrustScoreAbove => {
                let score = score.ok_or_else(|| DisclosureError::ClaimNotAvailable {
                    claim,
                    reason: "no identity score on record".into(),
                })?;
                let threshold = params.score_threshold().ok_or_else(|| {
                    DisclosureError::InvalidClaimType("trust_score_above requires a score threshold".into())
                })?;
                ClaimProof::Range(
                    backend
                        .prove_range(
                            &domain,
                            u64::from(score.score),
                            u64::from(threshold),
                            &nonce,
                            &salt,
                        )
                        .map_err(|e| refusal(claim, e))?,
                )
            }
            ClaimType::CountryResident => {
                let country = record.residency_country.as_ref().ok_or_else(|| {
                    DisclosureError::ClaimNotAvailable {
                        claim,
                        reason: "no verified residency country".into(),
                    }
                })?;
                let expected = params.residency.as_ref().and_then(|r| r.country.as_ref());
                if expected.is_some_and(|c| c != country) {
                    return Err(DisclosureError::ClaimNotAvailable {
                        claim,
                        reason: "residency differs from the requested country".into(),
                    });
                }
                let allowed = country_labels(&params.effective_allowed(Some(country)));
                ClaimProof::SetMembership(
                    backend
                        .prove_membership(&domain, country.as_str(), &allowed, &nonce, &salt)
                        .map_err(|e| refusal(claim, e))?,
                )
            }
            ClaimType::HumanVerified
            | ClaimType::EmailVerified
            | ClaimType::SmsVerified
            | ClaimType::DomainVerified
            | ClaimType::BiometricVerified => ClaimProof::PedersenKnowledge(
                backend
                    .prove_knowledge(
                        &domain,
                        &knowledge_secret(claim, &record.address),
                        &nonce,
                        &salt,
                    )
                    .map_err(|e| refusal(claim, e))?,
            ),
        };
        Ok(ClaimProofEntry::new(claim, proof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityStatus, IdentityTier};
    use crate::testutil::*;
    use veid_core::Timestamp;

    #[test]
    fn age_proof_for_standard_subject() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1alice", &[ClaimType::AgeOver18], ClaimParameters::default());
        let proof = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default())
            .unwrap();
        assert_eq!(proof.claim_types.len(), 1);
        assert_eq!(proof.valid_until.epoch_secs() - proof.created_at.epoch_secs(), 3_600);
        assert_eq!(proof.metadata.commitment_salt.len(), 64);
        assert_eq!(proof.proof_id, proof_id(&req.request_id, &proof.subject, &proof.nonce));
    }

    #[test]
    fn false_age_statement_is_refused() {
        let (engine, state) = setup();
        // veid1young93 derives to 19.
        let req = request(&engine, "veid1young93", &[ClaimType::AgeOver21], ClaimParameters::default());
        let err = engine
            .generate_proof(&ctx(), &state, &addr("veid1young93"), &req, &ProofOptions::default())
            .unwrap_err();
        assert!(matches!(err, DisclosureError::ClaimNotAvailable { claim: ClaimType::AgeOver21, .. }));
    }

    #[test]
    fn score_below_threshold_is_refused() {
        let (engine, state) = setup();
        let params = ClaimParameters::default().with_score_threshold(90);
        let req = request(&engine, "veid1alice", &[ClaimType::TrustScoreAbove], params);
        let err = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default())
            .unwrap_err();
        assert!(matches!(err, DisclosureError::ClaimNotAvailable { .. }));
    }

    #[test]
    fn country_outside_allowed_set_is_refused() {
        let (engine, state) = setup();
        let params = ClaimParameters::default().with_allowed_countries([cc("FR"), cc("NL")]);
        let req = request(&engine, "veid1alice", &[ClaimType::CountryResident], params);
        let err = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default())
            .unwrap_err();
        assert!(matches!(err, DisclosureError::ClaimNotAvailable { .. }));
    }

    #[test]
    fn residency_metadata_records_defaulted_set() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1alice", &[ClaimType::CountryResident], ClaimParameters::default());
        let proof = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default())
            .unwrap();
        assert_eq!(proof.metadata.claim_parameters, r#"{"residency":{"allowed":["DE"]}}"#);
    }

    #[test]
    fn unsupported_scheme_is_refused() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1alice", &[ClaimType::HumanVerified], ClaimParameters::default());
        let options = ProofOptions {
            scheme: ProofScheme::Groth16,
            ..Default::default()
        };
        assert_eq!(
            engine
                .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &options)
                .unwrap_err(),
            DisclosureError::InvalidProofScheme(ProofScheme::Groth16)
        );
    }

    #[test]
    fn expired_request_is_refused() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1alice", &[ClaimType::HumanVerified], ClaimParameters::default());
        let late = BlockContext::new(
            200,
            Timestamp::from_epoch_secs(req.expires_at.epoch_secs()).unwrap(),
        );
        assert_eq!(
            engine
                .generate_proof(&late, &state, &addr("veid1alice"), &req, &ProofOptions::default())
                .unwrap_err(),
            DisclosureError::ProofRequestExpired
        );
    }

    #[test]
    fn other_subject_is_unauthorized() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1alice", &[ClaimType::HumanVerified], ClaimParameters::default());
        assert!(matches!(
            engine.generate_proof(&ctx(), &state, &addr("veid1bob"), &req, &ProofOptions::default()),
            Err(DisclosureError::Unauthorized(_))
        ));
    }

    #[test]
    fn missing_record_is_reported() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1ghost", &[ClaimType::HumanVerified], ClaimParameters::default());
        assert_eq!(
            engine
                .generate_proof(&ctx(), &state, &addr("veid1ghost"), &req, &ProofOptions::default())
                .unwrap_err(),
            DisclosureError::IdentityRecordNotFound(addr("veid1ghost"))
        );
    }

    #[test]
    fn basic_tier_cannot_prove_age() {
        let (engine, mut state) = setup();
        state.records.get_mut(&addr("veid1alice")).unwrap().tier = IdentityTier::Basic;
        let req = request(&engine, "veid1alice", &[ClaimType::AgeOver18], ClaimParameters::default());
        assert!(matches!(
            engine.generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default()),
            Err(DisclosureError::InsufficientVerificationLevel { .. })
        ));
    }

    #[test]
    fn suspended_subject_is_refused() {
        let (engine, mut state) = setup();
        state.records.get_mut(&addr("veid1alice")).unwrap().status = IdentityStatus::Suspended;
        let req = request(&engine, "veid1alice", &[ClaimType::EmailVerified], ClaimParameters::default());
        assert!(matches!(
            engine.generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default()),
            Err(DisclosureError::ClaimNotAvailable { .. })
        ));
    }

    #[test]
    fn undisclosable_claim_is_rejected() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1alice", &[ClaimType::HumanVerified], ClaimParameters::default());
        let options = ProofOptions {
            disclosed_claims: [(ClaimType::EmailVerified, serde_json::json!(true))]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        assert!(matches!(
            engine.generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &options),
            Err(DisclosureError::InvalidProofRequest(_))
        ));
    }

    #[test]
    fn disclosed_claims_change_the_proof_id() {
        let (engine, state) = setup();
        let req = request(&engine, "veid1alice", &[ClaimType::EmailVerified], ClaimParameters::default());
        let hidden = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default())
            .unwrap();
        let options = ProofOptions {
            disclosed_claims: [(ClaimType::EmailVerified, serde_json::json!(true))]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let revealed = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &options)
            .unwrap();
        assert_ne!(hidden.proof_id, revealed.proof_id);
        assert_ne!(hidden.nonce, revealed.nonce);
    }

    #[test]
    fn generation_is_deterministic() {
        let (engine, state) = setup();
        let claims = [ClaimType::AgeOver25, ClaimType::CountryResident, ClaimType::SmsVerified];
        let req = request(&engine, "veid1alice", &claims, ClaimParameters::default());
        let a = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default())
            .unwrap();
        let b = engine
            .generate_proof(&ctx(), &state, &addr("veid1alice"), &req, &ProofOptions::default())
            .unwrap();
        assert_eq!(a, b);
    }
}
