//! # Specialized Single-Claim Proofs
//!
//! Typed shortcuts for the three parameterized statements. Each runs the
//! same sequence as the bundle generator (availability gate, evaluate the
//! statement, refuse if false, build the proof) for one claim, and returns
//! a [`TypedProof`] instead of a bundle.
//!
//! | Proof | Statement | Randomness domains |
//! |-------|-----------|--------------------|
//! | [`AgeProof`] | derived age ≥ `min_age` | `veid:age:nonce`, `veid:age:commitment_salt` |
//! | [`ResidencyProof`] | residency ∈ `allowed` | `veid:residency:nonce`, `veid:residency:commitment_salt` |
//! | [`ScoreThresholdProof`] | composite score ≥ `threshold` | `veid:score:nonce`, `veid:score:salt` |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use veid_core::encoding::hex_bytes;
use veid_core::{domain_hash, AccountAddress, BlockContext, CountryCode, Digest32, Timestamp};
use veid_crypto::randomness::domains;
use veid_crypto::{RandomnessInputs, RandomnessResolver};
use veid_zkp::{RangeProof, SetMembershipProof, VerifyError};

use crate::availability::validate_claim_availability;
use crate::claims::ClaimType;
use crate::engine::DisclosureEngine;
use crate::error::DisclosureError;
use crate::generator::{country_labels, record_refusal, refusal};
use crate::identity::IdentityRecord;
use crate::lookup::{IdentityLookup, ScoreLookup};

const AGE_DOMAIN: &str = "veid:age:range";
const RESIDENCY_DOMAIN: &str = "veid:residency:membership";
const SCORE_DOMAIN: &str = "veid:score:range";
const PROOF_ID_DOMAIN: &str = "veid:specialized:proof_id";

/// A single-claim proof over a public bound `B` with payload `P`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedProof<B, P> {
    pub proof_id: Digest32,
    pub subject: AccountAddress,
    /// The public side of the statement.
    pub bound: B,
    #[serde(with = "hex_bytes")]
    pub commitment: Vec<u8>,
    pub proof: P,
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
    pub created_at: Timestamp,
}

/// Proof that the subject's derived age is at least `bound`.
pub type AgeProof = TypedProof<u64, RangeProof>;
/// Proof that the subject resides in one of the `bound` countries.
pub type ResidencyProof = TypedProof<BTreeSet<CountryCode>, SetMembershipProof>;
/// Proof that the subject's composite score is at least `bound`.
pub type ScoreThresholdProof = TypedProof<u32, RangeProof>;

fn specialized_id(domain: &str, subject: &AccountAddress, nonce: &[u8]) -> Digest32 {
    domain_hash(
        PROOF_ID_DOMAIN,
        &[domain.as_bytes(), subject.as_bytes(), nonce],
    )
}

fn check_header<B, P>(
    proof: &TypedProof<B, P>,
    domain: &str,
    commitment: Vec<u8>,
) -> Result<(), DisclosureError> {
    if specialized_id(domain, &proof.subject, &proof.nonce) != proof.proof_id {
        return Err(DisclosureError::InvalidProof(
            "proof id does not match subject and nonce".into(),
        ));
    }
    if commitment != proof.commitment {
        return Err(DisclosureError::InvalidProof("commitment mismatch".into()));
    }
    Ok(())
}

fn verify_failure(err: VerifyError) -> DisclosureError {
    match err {
        VerifyError::UnsupportedScheme(s) => DisclosureError::InvalidProofScheme(s),
        other => DisclosureError::InvalidProof(other.to_string()),
    }
}

impl DisclosureEngine {
    fn gated_record(
        &self,
        identities: &(impl IdentityLookup + ?Sized),
        subject: &AccountAddress,
        claim: ClaimType,
        scores: Option<&(impl ScoreLookup + ?Sized)>,
    ) -> Result<(IdentityRecord, Option<veid_scoring::IdentityScore>), DisclosureError> {
        let record = identities
            .get_identity_record(subject)
            .ok_or_else(|| DisclosureError::IdentityRecordNotFound(subject.clone()))?;
        let score = scores.and_then(|s| s.get_identity_score(subject));
        validate_claim_availability(&record, claim, score.as_ref())?;
        Ok((record, score))
    }

    /// Prove that `subject`'s derived age is at least `min_age`.
    pub fn create_age_proof<L>(
        &self,
        ctx: &BlockContext,
        identities: &L,
        subject: &AccountAddress,
        min_age: u64,
        randomness: &RandomnessInputs,
    ) -> Result<AgeProof, DisclosureError>
    where
        L: IdentityLookup + ?Sized,
    {
        let build = || -> Result<AgeProof, DisclosureError> {
            let (record, _) =
                self.gated_record(identities, subject, ClaimType::AgeOver18, None::<&NoScores>)?;
            let resolver = RandomnessResolver::for_block(ctx);
            let context: [&[u8]; 2] = [subject.as_bytes(), &min_age.to_be_bytes()];
            let nonce = resolver.resolve(randomness.nonce.as_deref(), domains::AGE_NONCE, &context);
            let salt = resolver.resolve(
                randomness.commitment_salt.as_deref(),
                domains::AGE_COMMITMENT_SALT,
                &context,
            );
            let proof = self
                .backend()
                .prove_range(AGE_DOMAIN, record.derived_age(), min_age, &nonce, &salt)
                .map_err(|e| refusal(ClaimType::AgeOver18, e))?;
            Ok(TypedProof {
                proof_id: specialized_id(AGE_DOMAIN, subject, &nonce),
                subject: subject.clone(),
                bound: min_age,
                commitment: proof.commitment_bytes(),
                proof,
                nonce,
                created_at: ctx.time,
            })
        };
        build().map_err(|e| {
            record_refusal(subject, &e);
            e
        })
    }

    /// Check an age proof against the minimum age the verifier requires.
    pub fn verify_age_proof(&self, proof: &AgeProof, min_age: u64) -> Result<(), DisclosureError> {
        check_header(proof, AGE_DOMAIN, proof.proof.commitment_bytes())?;
        if proof.bound != min_age {
            return Err(DisclosureError::InvalidProof(format!(
                "proof is for age {}, not {min_age}",
                proof.bound
            )));
        }
        self.backend()
            .verify_range(AGE_DOMAIN, &proof.proof, min_age)
            .map_err(verify_failure)
    }

    /// Prove that `subject` resides in one of `allowed`.
    pub fn create_residency_proof<L>(
        &self,
        ctx: &BlockContext,
        identities: &L,
        subject: &AccountAddress,
        allowed: &BTreeSet<CountryCode>,
        randomness: &RandomnessInputs,
    ) -> Result<ResidencyProof, DisclosureError>
    where
        L: IdentityLookup + ?Sized,
    {
        let claim = ClaimType::CountryResident;
        let build = || -> Result<ResidencyProof, DisclosureError> {
            if allowed.is_empty() {
                return Err(DisclosureError::InvalidClaimType(
                    "country_resident requires a non-empty allowed set".into(),
                ));
            }
            let (record, _) = self.gated_record(identities, subject, claim, None::<&NoScores>)?;
            let country = record.residency_country.as_ref().ok_or_else(|| {
                DisclosureError::ClaimNotAvailable {
                    claim,
                    reason: "no verified residency country".into(),
                }
            })?;
            let resolver = RandomnessResolver::for_block(ctx);
            let context: [&[u8]; 1] = [subject.as_bytes()];
            let nonce =
                resolver.resolve(randomness.nonce.as_deref(), domains::RESIDENCY_NONCE, &context);
            let salt = resolver.resolve(
                randomness.commitment_salt.as_deref(),
                domains::RESIDENCY_COMMITMENT_SALT,
                &context,
            );
            let proof = self
                .backend()
                .prove_membership(
                    RESIDENCY_DOMAIN,
                    country.as_str(),
                    &country_labels(allowed),
                    &nonce,
                    &salt,
                )
                .map_err(|e| refusal(claim, e))?;
            Ok(TypedProof {
                proof_id: specialized_id(RESIDENCY_DOMAIN, subject, &nonce),
                subject: subject.clone(),
                bound: allowed.clone(),
                commitment: proof.commitment_bytes(),
                proof,
                nonce,
                created_at: ctx.time,
            })
        };
        build().map_err(|e| {
            record_refusal(subject, &e);
            e
        })
    }

    /// Check a residency proof against the set the verifier accepts.
    pub fn verify_residency_proof(
        &self,
        proof: &ResidencyProof,
        allowed: &BTreeSet<CountryCode>,
    ) -> Result<(), DisclosureError> {
        check_header(proof, RESIDENCY_DOMAIN, proof.proof.commitment_bytes())?;
        if &proof.bound != allowed {
            return Err(DisclosureError::InvalidProof(
                "proof was made for a different allowed set".into(),
            ));
        }
        self.backend()
            .verify_membership(RESIDENCY_DOMAIN, &proof.proof, &country_labels(allowed))
            .map_err(verify_failure)
    }

    /// Prove that `subject`'s stored composite score is at least
    /// `threshold`. The commitment salt comes from the score salt input.
    pub fn create_score_threshold_proof<S>(
        &self,
        ctx: &BlockContext,
        state: &S,
        subject: &AccountAddress,
        threshold: u32,
        randomness: &RandomnessInputs,
    ) -> Result<ScoreThresholdProof, DisclosureError>
    where
        S: IdentityLookup + ScoreLookup + ?Sized,
    {
        let claim = ClaimType::TrustScoreAbove;
        let build = || -> Result<ScoreThresholdProof, DisclosureError> {
            if threshold > 100 {
                return Err(DisclosureError::InvalidClaimType(format!(
                    "score threshold {threshold} outside [0, 100]"
                )));
            }
            let (_, score) = self.gated_record(state, subject, claim, Some(state))?;
            let score = score.ok_or_else(|| DisclosureError::ClaimNotAvailable {
                claim,
                reason: "no identity score on record".into(),
            })?;
            let resolver = RandomnessResolver::for_block(ctx);
            let context: [&[u8]; 2] = [subject.as_bytes(), &threshold.to_be_bytes()];
            let nonce = resolver.resolve(randomness.nonce.as_deref(), domains::SCORE_NONCE, &context);
            let salt = resolver.resolve(randomness.score_salt.as_deref(), domains::SCORE_SALT, &context);
            let proof = self
                .backend()
                .prove_range(
                    SCORE_DOMAIN,
                    u64::from(score.score),
                    u64::from(threshold),
                    &nonce,
                    &salt,
                )
                .map_err(|e| refusal(claim, e))?;
            Ok(TypedProof {
                proof_id: specialized_id(SCORE_DOMAIN, subject, &nonce),
                subject: subject.clone(),
                bound: threshold,
                commitment: proof.commitment_bytes(),
                proof,
                nonce,
                created_at: ctx.time,
            })
        };
        build().map_err(|e| {
            record_refusal(subject, &e);
            e
        })
    }

    /// Check a score proof against the threshold the verifier requires.
    pub fn verify_score_threshold_proof(
        &self,
        proof: &ScoreThresholdProof,
        threshold: u32,
    ) -> Result<(), DisclosureError> {
        check_header(proof, SCORE_DOMAIN, proof.proof.commitment_bytes())?;
        if proof.bound != threshold {
            return Err(DisclosureError::InvalidProof(format!(
                "proof is for threshold {}, not {threshold}",
                proof.bound
            )));
        }
        self.backend()
            .verify_range(SCORE_DOMAIN, &proof.proof, u64::from(threshold))
            .map_err(verify_failure)
    }
}

/// Score source for gates that need none.
struct NoScores;

impl ScoreLookup for NoScores {
    fn get_identity_score(&self, _subject: &AccountAddress) -> Option<veid_scoring::IdentityScore> {
        None
    }
}
