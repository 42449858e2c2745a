//! # Stored Identity Scores
//!
//! The persisted form of a composite score, kept under
//! `veid/score/<address>`. Disclosure reads it back to gate and prove
//! `TrustScoreAbove` claims.

use serde::{Deserialize, Serialize};
use veid_core::store::{get_json, set_json};
use veid_core::{AccountAddress, Digest32, KvStore, Timestamp};

use crate::components::ReasonCode;
use crate::engine::{CompositeScoreResult, CompositeScoringInputs, ScoringEngine};
use crate::error::ScoringError;

const SCORE_PREFIX: &str = "veid/score/";

/// A persisted identity score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityScore {
    pub account: AccountAddress,
    /// Final score in `[0, 100]`.
    pub score: u32,
    pub passed: bool,
    pub model_version: String,
    pub input_hash: Digest32,
    pub reason_codes: Vec<ReasonCode>,
    pub block_height: u64,
    pub computed_at: Timestamp,
}

impl From<CompositeScoreResult> for IdentityScore {
    fn from(r: CompositeScoreResult) -> Self {
        Self {
            account: r.account,
            score: r.final_score,
            passed: r.passed,
            model_version: r.score_version,
            input_hash: r.input_hash,
            reason_codes: r.reason_codes,
            block_height: r.block_height,
            computed_at: r.timestamp,
        }
    }
}

/// Store key for an account's score.
pub fn score_key(account: &AccountAddress) -> Vec<u8> {
    format!("{SCORE_PREFIX}{account}").into_bytes()
}

/// Read an account's stored score.
pub fn get_identity_score(
    store: &(impl KvStore + ?Sized),
    account: &AccountAddress,
) -> Result<Option<IdentityScore>, ScoringError> {
    Ok(get_json(store, &score_key(account))?)
}

/// Overwrite an account's stored score.
pub fn set_identity_score(
    store: &mut (impl KvStore + ?Sized),
    score: &IdentityScore,
) -> Result<(), ScoringError> {
    Ok(set_json(store, &score_key(&score.account), score)?)
}

impl ScoringEngine {
    /// Compute a score and persist it. Nothing is written if computation
    /// fails.
    pub fn compute_and_store(
        &self,
        store: &mut (impl KvStore + ?Sized),
        inputs: &CompositeScoringInputs,
    ) -> Result<IdentityScore, ScoringError> {
        let score = IdentityScore::from(self.compute(inputs)?);
        set_identity_score(store, &score)?;
        tracing::debug!(account = %score.account, model = %score.model_version, "identity score stored");
        Ok(score)
    }
}

/// Compute with the default configuration and persist.
pub fn compute_and_store_composite_score(
    store: &mut (impl KvStore + ?Sized),
    inputs: &CompositeScoringInputs,
) -> Result<IdentityScore, ScoringError> {
    ScoringEngine::default().compute_and_store(store, inputs)
}
