//! Shared fixtures for unit tests.

use std::collections::BTreeMap;

use veid_core::{AccountAddress, BlockContext, CountryCode, Digest32, Timestamp};
use veid_crypto::RandomnessInputs;
use veid_scoring::{IdentityScore, ReasonCode};

use crate::claims::{ClaimParameters, ClaimType};
use crate::engine::DisclosureEngine;
use crate::identity::{IdentityRecord, IdentityTier};
use crate::lookup::{IdentityLookup, ScoreLookup};
use crate::request::{RequestDraft, SelectiveDisclosureRequest};

pub const GENESIS: i64 = 1_700_000_000;

#[derive(Debug, Default)]
pub struct TestState {
    pub records: BTreeMap<AccountAddress, IdentityRecord>,
    pub scores: BTreeMap<AccountAddress, IdentityScore>,
}

impl IdentityLookup for TestState {
    fn get_identity_record(&self, subject: &AccountAddress) -> Option<IdentityRecord> {
        self.records.get_identity_record(subject)
    }
}

impl ScoreLookup for TestState {
    fn get_identity_score(&self, subject: &AccountAddress) -> Option<IdentityScore> {
        self.scores.get_identity_score(subject)
    }
}

pub fn addr(s: &str) -> AccountAddress {
    AccountAddress::new(s).unwrap()
}

pub fn cc(s: &str) -> CountryCode {
    CountryCode::new(s).unwrap()
}

pub fn ctx() -> BlockContext {
    BlockContext::new(100, Timestamp::from_epoch_secs(GENESIS).unwrap())
}

pub fn at(secs: i64) -> BlockContext {
    BlockContext::new(100, Timestamp::from_epoch_secs(secs).unwrap())
}

pub fn score(account: &str, value: u32) -> IdentityScore {
    IdentityScore {
        account: addr(account),
        score: value,
        passed: value >= 50,
        model_version: "veid-composite-v1".into(),
        input_hash: Digest32::new([7; 32]),
        reason_codes: vec![ReasonCode::Success],
        block_height: 99,
        computed_at: Timestamp::from_epoch_secs(GENESIS).unwrap(),
    }
}

/// alice (age 36, DE, score 70), bob (basic tier), young93 (age 19, DE).
pub fn setup() -> (DisclosureEngine, TestState) {
    let created = Timestamp::from_epoch_secs(GENESIS).unwrap();
    let mut state = TestState::default();
    state.records.insert(
        addr("veid1alice"),
        IdentityRecord::new(addr("veid1alice"), IdentityTier::Standard, created)
            .with_residency(cc("DE")),
    );
    state.records.insert(
        addr("veid1bob"),
        IdentityRecord::new(addr("veid1bob"), IdentityTier::Basic, created),
    );
    state.records.insert(
        addr("veid1young93"),
        IdentityRecord::new(addr("veid1young93"), IdentityTier::Standard, created)
            .with_residency(cc("DE")),
    );
    state.scores.insert(addr("veid1alice"), score("veid1alice", 70));
    (DisclosureEngine::default(), state)
}

pub fn request(
    engine: &DisclosureEngine,
    subject: &str,
    claims: &[ClaimType],
    params: ClaimParameters,
) -> SelectiveDisclosureRequest {
    let draft = RequestDraft {
        requester: addr("veid1bank"),
        subject: addr(subject),
        claims: claims.iter().copied().collect(),
        params,
        purpose: "account opening".into(),
        validity_secs: 3_600,
        request_expiry_secs: 0,
    };
    engine
        .create_request(&ctx(), draft, &RandomnessInputs::derived())
        .unwrap()
}
