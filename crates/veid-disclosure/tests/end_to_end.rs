//! # End-to-End Disclosure Scenarios
//!
//! Drives request creation, proof generation and verification through the
//! public API only, over an in-memory store, the way a host chain would.

use std::collections::BTreeSet;

use veid_core::{AccountAddress, BlockContext, CountryCode, MemoryStore, Timestamp};
use veid_crypto::RandomnessInputs;
use veid_disclosure::{
    ClaimParameters, ClaimType, DisclosureEngine, DisclosureError, DisclosureKeeper,
    IdentityRecord, IdentityTier, MemoryEventSink, NoRevocations, ProofOptions, RequestDraft,
    SelectiveDisclosureProof,
};
use veid_scoring::ScoringEngine;

const GENESIS: i64 = 1_700_000_000;

fn addr(s: &str) -> AccountAddress {
    AccountAddress::new(s).unwrap()
}

fn block(height: u64, secs: i64) -> BlockContext {
    BlockContext::new(height, Timestamp::from_epoch_secs(secs).unwrap())
}

fn keeper() -> DisclosureKeeper<MemoryStore, MemoryEventSink> {
    let mut k = DisclosureKeeper::new(
        MemoryStore::new(),
        MemoryEventSink::new(),
        DisclosureEngine::default(),
        ScoringEngine::default(),
    );
    let created = Timestamp::from_epoch_secs(GENESIS).unwrap();
    for (name, country) in [("veid1subject19", "DE"), ("veid1young93", "FR")] {
        k.set_identity_record(
            &IdentityRecord::new(addr(name), IdentityTier::Standard, created)
                .with_residency(CountryCode::new(country).unwrap()),
        )
        .unwrap();
    }
    k
}

fn draft(subject: &str, claims: &[ClaimType]) -> RequestDraft {
    RequestDraft {
        requester: addr("veid1exchange"),
        subject: addr(subject),
        claims: claims.iter().copied().collect(),
        params: ClaimParameters::default(),
        purpose: "age-restricted market access".into(),
        validity_secs: 7_200,
        request_expiry_secs: 600,
    }
}

fn prove(
    k: &mut DisclosureKeeper<MemoryStore, MemoryEventSink>,
    subject: &str,
    claims: &[ClaimType],
) -> Result<SelectiveDisclosureProof, veid_disclosure::KeeperError> {
    let ctx = block(10, GENESIS + 60);
    let req = k.submit_request(&ctx, draft(subject, claims), &RandomnessInputs::derived())?;
    k.submit_proof(&block(11, GENESIS + 66), &addr(subject), &req.request_id, &ProofOptions::default())
}

#[test]
fn standard_subject_proves_age_over_18() {
    let mut k = keeper();
    let proof = prove(&mut k, "veid1subject19", &[ClaimType::AgeOver18]).unwrap();

    let result = k.verify(&block(12, GENESIS + 120), &proof, &addr("veid1exchange"));
    assert!(result.is_valid, "{:?}", result.error);
    assert_eq!(result.verified_claims, vec![ClaimType::AgeOver18]);
    assert!(result.proof_hash.is_some());
}

#[test]
fn age_proof_checked_against_a_higher_bound_is_invalid() {
    let engine = DisclosureEngine::default();
    let k = keeper();
    let ctx = block(12, GENESIS + 120);
    // Derived age of veid1subject19 is 35.
    let proof = engine
        .create_age_proof(&ctx, &k.lookups(), &addr("veid1subject19"), 18, &RandomnessInputs::derived())
        .unwrap();
    engine.verify_age_proof(&proof, 18).unwrap();
    assert!(matches!(
        engine.verify_age_proof(&proof, 40),
        Err(DisclosureError::InvalidProof(_))
    ));
}

#[test]
fn false_age_statement_is_refused_not_proven() {
    let mut k = keeper();
    // Derived age of veid1young93 is 19.
    prove(&mut k, "veid1young93", &[ClaimType::AgeOver18]).unwrap();
    let err = prove(&mut k, "veid1young93", &[ClaimType::AgeOver21]).unwrap_err();
    assert!(err.to_string().contains("age_over_21"));
}

#[test]
fn proof_survives_json_transport() {
    let mut k = keeper();
    let claims = [ClaimType::AgeOver25, ClaimType::CountryResident, ClaimType::HumanVerified];
    let proof = prove(&mut k, "veid1subject19", &claims).unwrap();

    let wire = serde_json::to_string(&proof).unwrap();
    let received: SelectiveDisclosureProof = serde_json::from_str(&wire).unwrap();
    assert_eq!(received, proof);

    let engine = DisclosureEngine::default();
    let result = engine.verify_proof(&block(12, GENESIS + 120), &NoRevocations, &received, &addr("veid1exchange"));
    assert!(result.is_valid, "{:?}", result.error);
    assert_eq!(result.verified_claims.len(), 3);
}

#[test]
fn proof_expires_at_the_end_of_its_window() {
    let mut k = keeper();
    let proof = prove(&mut k, "veid1subject19", &[ClaimType::HumanVerified]).unwrap();
    let last = proof.valid_until.epoch_secs() - 1;
    assert!(k.verify(&block(20, last), &proof, &addr("veid1exchange")).is_valid);
    let expired = k.verify(&block(21, last + 1), &proof, &addr("veid1exchange"));
    assert!(!expired.is_valid);
    assert_eq!(expired.error.as_deref(), Some("proof expired"));
}

#[test]
fn request_expiry_is_enforced_at_generation() {
    let mut k = keeper();
    let req = k
        .submit_request(&block(10, GENESIS), draft("veid1subject19", &[ClaimType::HumanVerified]), &RandomnessInputs::derived())
        .unwrap();
    let err = k
        .submit_proof(&block(99, GENESIS + 600), &addr("veid1subject19"), &req.request_id, &ProofOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("request expired"));
}

#[test]
fn residency_set_from_request_is_used() {
    let mut k = keeper();
    let allowed: BTreeSet<_> = ["AT", "DE", "NL"]
        .into_iter()
        .map(|c| CountryCode::new(c).unwrap())
        .collect();
    let mut d = draft("veid1subject19", &[ClaimType::CountryResident]);
    d.params = ClaimParameters::default().with_allowed_countries(allowed.clone());
    let req = k.submit_request(&block(10, GENESIS), d, &RandomnessInputs::derived()).unwrap();
    let proof = k
        .submit_proof(&block(11, GENESIS + 6), &addr("veid1subject19"), &req.request_id, &ProofOptions::default())
        .unwrap();
    assert!(k.verify(&block(12, GENESIS + 12), &proof, &addr("veid1exchange")).is_valid);

    let engine = DisclosureEngine::default();
    let narrower = ClaimParameters::default()
        .with_allowed_countries(["DE", "NL"].map(|c| CountryCode::new(c).unwrap()));
    let result = engine.verify_proof_with_params(
        &block(12, GENESIS + 12),
        &NoRevocations,
        &proof,
        &addr("veid1exchange"),
        &narrower,
    );
    assert!(!result.is_valid);
}
