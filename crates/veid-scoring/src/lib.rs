//! # veid-scoring: Composite Identity Scoring
//!
//! Combines six independently verified signal categories into one
//! deterministic trust score with auditable reasoning:
//!
//! | Component             | Default weight |
//! |-----------------------|----------------|
//! | Document authenticity | 2500 bp        |
//! | Face match            | 2500 bp        |
//! | Liveness detection    | 2000 bp        |
//! | Data consistency      | 1500 bp        |
//! | Historical signals    | 1000 bp        |
//! | Risk indicators       | 500 bp         |
//!
//! ## Determinism
//!
//! Identical inputs produce byte-identical results on every validator. All
//! arithmetic is integer basis points; the timestamp is an input, never
//! sampled. Weight misconfiguration is rejected when the [`ScoringEngine`]
//! is built, not per computation.

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;

pub use components::{
    ComponentInput, DataConsistencyInput, DocumentAuthenticityInput, FaceMatchInput,
    HistoricalSignalsInput, LivenessDetectionInput, ReasonCode, RiskIndicatorsInput,
    ScoreComponent, MAX_BASIS_POINTS, NEUTRAL_SCORE,
};
pub use config::{CompositeScoringWeights, ScoringConfig, DEFAULT_PASS_THRESHOLD};
pub use engine::{
    compute_composite_identity_score, input_hash, ComponentContribution, CompositeScoreResult,
    CompositeScoringInputs, ScoringEngine, COMPOSITE_SCORE_VERSION,
};
pub use error::ScoringError;
pub use store::{
    compute_and_store_composite_score, get_identity_score, score_key, set_identity_score,
    IdentityScore,
};
