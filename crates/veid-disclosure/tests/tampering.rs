//! # Tamper Detection
//!
//! Altering any byte of a proof's bundle, its commitment hash, or the
//! public bounds it was made for must flip verification to invalid.

use std::collections::BTreeMap;

use veid_core::{AccountAddress, BlockContext, CountryCode, Digest32, Timestamp};
use veid_crypto::RandomnessInputs;
use veid_disclosure::{
    ClaimParameters, ClaimType, DisclosureEngine, IdentityRecord, IdentityTier, NoRevocations,
    ProofOptions, RequestDraft, SelectiveDisclosureProof,
};
use veid_scoring::IdentityScore;

const GENESIS: i64 = 1_700_000_000;

fn addr(s: &str) -> AccountAddress {
    AccountAddress::new(s).unwrap()
}

fn ctx() -> BlockContext {
    BlockContext::new(7, Timestamp::from_epoch_secs(GENESIS).unwrap())
}

struct State {
    records: BTreeMap<AccountAddress, IdentityRecord>,
    scores: BTreeMap<AccountAddress, IdentityScore>,
}

impl veid_disclosure::IdentityLookup for State {
    fn get_identity_record(&self, subject: &AccountAddress) -> Option<IdentityRecord> {
        self.records.get(subject).cloned()
    }
}

impl veid_disclosure::ScoreLookup for State {
    fn get_identity_score(&self, subject: &AccountAddress) -> Option<IdentityScore> {
        self.scores.get(subject).cloned()
    }
}

fn proof() -> (DisclosureEngine, SelectiveDisclosureProof) {
    let carol = addr("veid1carol");
    let created = Timestamp::from_epoch_secs(GENESIS).unwrap();
    let state = State {
        records: [(
            carol.clone(),
            IdentityRecord::new(carol.clone(), IdentityTier::Premium, created)
                .with_residency(CountryCode::new("NL").unwrap()),
        )]
        .into_iter()
        .collect(),
        scores: [(
            carol.clone(),
            IdentityScore {
                account: carol.clone(),
                score: 82,
                passed: true,
                model_version: "veid-composite-v1".into(),
                input_hash: Digest32::new([3; 32]),
                reason_codes: Vec::new(),
                block_height: 6,
                computed_at: created,
            },
        )]
        .into_iter()
        .collect(),
    };

    let engine = DisclosureEngine::default();
    let request = engine
        .create_request(
            &ctx(),
            RequestDraft {
                requester: addr("veid1lender"),
                subject: carol.clone(),
                claims: [
                    ClaimType::AgeOver25,
                    ClaimType::CountryResident,
                    ClaimType::TrustScoreAbove,
                    ClaimType::BiometricVerified,
                ]
                .into_iter()
                .collect(),
                params: ClaimParameters::default()
                    .with_score_threshold(75)
                    .with_allowed_countries(["BE", "NL"].map(|c| CountryCode::new(c).unwrap())),
                purpose: "credit line".into(),
                validity_secs: 86_400,
                request_expiry_secs: 0,
            },
            &RandomnessInputs::derived(),
        )
        .unwrap();
    let options = ProofOptions {
        disclosed_claims: [(ClaimType::BiometricVerified, serde_json::json!(true))]
            .into_iter()
            .collect(),
        ..Default::default()
    };
    let proof = engine
        .generate_proof(&ctx(), &state, &carol, &request, &options)
        .unwrap();
    (engine, proof)
}

fn is_valid(engine: &DisclosureEngine, p: &SelectiveDisclosureProof) -> bool {
    engine
        .verify_proof(&ctx(), &NoRevocations, p, &addr("veid1lender"))
        .is_valid
}

#[test]
fn untampered_proof_verifies() {
    let (engine, p) = proof();
    assert!(is_valid(&engine, &p));
}

#[test]
fn every_proof_value_byte_matters() {
    let (engine, p) = proof();
    // Flipping the low bit keeps most bytes printable JSON, so the
    // structural and cryptographic checks are what catch it.
    for i in (0..p.proof_value.len()).step_by(7) {
        let mut t = p.clone();
        t.proof_value[i] ^= 0x01;
        assert!(!is_valid(&engine, &t), "byte {i} of proof_value");
    }
}

#[test]
fn every_commitment_hash_byte_matters() {
    let (engine, p) = proof();
    for i in 0..32 {
        let mut bytes = *p.commitment_hash.as_bytes();
        bytes[i] ^= 0x80;
        let mut t = p.clone();
        t.commitment_hash = Digest32::new(bytes);
        assert!(!is_valid(&engine, &t), "byte {i} of commitment_hash");
    }
}

#[test]
fn disclosed_value_cannot_be_changed() {
    let (engine, mut p) = proof();
    p.disclosed_claims
        .insert(ClaimType::BiometricVerified, serde_json::json!(false));
    assert!(!is_valid(&engine, &p));
}

#[test]
fn metadata_bounds_cannot_be_lowered() {
    let (engine, p) = proof();
    let mut t = p.clone();
    t.metadata.claim_parameters = t.metadata.claim_parameters.replace("75", "70");
    assert_ne!(t.metadata.claim_parameters, p.metadata.claim_parameters);
    assert!(!is_valid(&engine, &t));

    let mut t = p.clone();
    t.metadata.claim_parameters = t.metadata.claim_parameters.replace("\"BE\",", "");
    assert_ne!(t.metadata.claim_parameters, p.metadata.claim_parameters);
    assert!(!is_valid(&engine, &t));
}

#[test]
fn verifier_bounds_must_match_the_proof() {
    let (engine, p) = proof();
    let v = addr("veid1lender");
    let exact = ClaimParameters::default()
        .with_score_threshold(75)
        .with_allowed_countries(["BE", "NL"].map(|c| CountryCode::new(c).unwrap()));
    assert!(engine.verify_proof_with_params(&ctx(), &NoRevocations, &p, &v, &exact).is_valid);

    let stricter = ClaimParameters::default()
        .with_score_threshold(80)
        .with_allowed_countries(["BE", "NL"].map(|c| CountryCode::new(c).unwrap()));
    assert!(!engine.verify_proof_with_params(&ctx(), &NoRevocations, &p, &v, &stricter).is_valid);

    let other_set = ClaimParameters::default()
        .with_score_threshold(75)
        .with_allowed_countries(["NL"].map(|c| CountryCode::new(c).unwrap()));
    assert!(!engine.verify_proof_with_params(&ctx(), &NoRevocations, &p, &v, &other_set).is_valid);
}

#[test]
fn entries_cannot_be_dropped_or_reordered() {
    let (engine, p) = proof();
    let mut bundle: veid_disclosure::SelectiveDisclosureProofBundle =
        serde_json::from_slice(&p.proof_value).unwrap();

    let mut dropped = bundle.clone();
    dropped.entries.pop();
    let mut t = p.clone();
    t.proof_value = veid_core::CanonicalBytes::new(&dropped).unwrap().into_bytes();
    assert!(!is_valid(&engine, &t));

    bundle.entries.swap(0, 1);
    let mut t = p.clone();
    t.proof_value = veid_core::CanonicalBytes::new(&bundle).unwrap().into_bytes();
    assert!(!is_valid(&engine, &t));
}
