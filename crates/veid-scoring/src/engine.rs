//! # Composite Scoring Engine
//!
//! Reduces six component scores into one final score in `[0, 100]`:
//!
//! ```text
//! final = min(100, round(Σ weight_i · score_i / 10000 / 100))
//! ```
//!
//! with weights and scores in basis points, rounding half up in integer
//! arithmetic. The result carries one contribution per component (always
//! six, in [`ScoreComponent::ALL`] order), the reason codes, and a SHA-256
//! digest over the canonical inputs.
//!
//! The engine is a pure function of the inputs and its validated config.
//! The timestamp is an input field; nothing here reads a clock.

use serde::{Deserialize, Serialize};
use veid_core::{sha256_digest, AccountAddress, CanonicalBytes, Digest32, Timestamp};

use crate::components::{
    ComponentInput, DataConsistencyInput, DocumentAuthenticityInput, FaceMatchInput,
    HistoricalSignalsInput, LivenessDetectionInput, ReasonCode, RiskIndicatorsInput,
    ScoreComponent, MAX_BASIS_POINTS,
};
use crate::config::ScoringConfig;
use crate::error::ScoringError;

/// Version tag of the composite model. Stored as the score's model version
/// and bound into the input hash.
pub const COMPOSITE_SCORE_VERSION: &str = "veid-composite-v1";

/// Per-account inputs to one score computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScoringInputs {
    pub account: AccountAddress,
    pub block_height: u64,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub document_authenticity: DocumentAuthenticityInput,
    #[serde(default)]
    pub face_match: FaceMatchInput,
    #[serde(default)]
    pub liveness_detection: LivenessDetectionInput,
    #[serde(default)]
    pub data_consistency: DataConsistencyInput,
    #[serde(default)]
    pub historical_signals: HistoricalSignalsInput,
    #[serde(default)]
    pub risk_indicators: RiskIndicatorsInput,
}

impl CompositeScoringInputs {
    /// Inputs with every component absent.
    pub fn new(account: AccountAddress, block_height: u64, timestamp: Timestamp) -> Self {
        Self {
            account,
            block_height,
            timestamp,
            document_authenticity: Default::default(),
            face_match: Default::default(),
            liveness_detection: Default::default(),
            data_consistency: Default::default(),
            historical_signals: Default::default(),
            risk_indicators: Default::default(),
        }
    }

    fn validate(&self) -> Result<(), ScoringError> {
        self.document_authenticity.validate()?;
        self.face_match.validate()?;
        self.liveness_detection.validate()?;
        self.data_consistency.validate()?;
        self.historical_signals.validate()?;
        self.risk_indicators.validate()
    }

    fn outcomes(&self) -> [ComponentOutcome; 6] {
        [
            ComponentOutcome::of(&self.document_authenticity),
            ComponentOutcome::of(&self.face_match),
            ComponentOutcome::of(&self.liveness_detection),
            ComponentOutcome::of(&self.data_consistency),
            ComponentOutcome::of(&self.historical_signals),
            ComponentOutcome::of(&self.risk_indicators),
        ]
    }
}

struct ComponentOutcome {
    component: ScoreComponent,
    present: bool,
    score: u32,
    reason: Option<ReasonCode>,
}

impl ComponentOutcome {
    fn of<C: ComponentInput>(input: &C) -> Self {
        Self {
            component: C::COMPONENT,
            present: input.present(),
            score: input.compute_score(),
            reason: input.reason(),
        }
    }
}

/// One component's share of the final score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentContribution {
    pub component: ScoreComponent,
    pub present: bool,
    /// Configured weight in basis points.
    pub weight: u32,
    /// Component score in basis points.
    pub raw_score: u32,
    /// `weight · raw_score / 10000`, in basis points of the final score.
    pub weighted_score: u32,
}

/// Outcome of one score computation. Never mutated; re-scoring yields a
/// new result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeScoreResult {
    pub account: AccountAddress,
    pub final_score: u32,
    pub passed: bool,
    pub reason_codes: Vec<ReasonCode>,
    pub contributions: Vec<ComponentContribution>,
    pub input_hash: Digest32,
    pub score_version: String,
    pub block_height: u64,
    pub timestamp: Timestamp,
}

#[derive(Serialize)]
struct HashedInputs<'a> {
    version: &'static str,
    inputs: &'a CompositeScoringInputs,
}

/// SHA-256 over the canonical inputs and the model version.
pub fn input_hash(inputs: &CompositeScoringInputs) -> Result<Digest32, ScoringError> {
    let canonical = CanonicalBytes::new(&HashedInputs {
        version: COMPOSITE_SCORE_VERSION,
        inputs,
    })?;
    Ok(sha256_digest(&canonical))
}

/// A scoring engine bound to a validated configuration.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Validate `config` and build an engine over it.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Compute the composite score.
    pub fn compute(
        &self,
        inputs: &CompositeScoringInputs,
    ) -> Result<CompositeScoreResult, ScoringError> {
        inputs.validate()?;
        let input_hash = input_hash(inputs)?;

        let mut weighted_total: u64 = 0;
        let mut contributions = Vec::with_capacity(ScoreComponent::ALL.len());
        let mut reason_codes = Vec::new();
        for outcome in inputs.outcomes() {
            let weight = self.config.weights.weight(outcome.component);
            let product = u64::from(weight) * u64::from(outcome.score);
            weighted_total += product;
            contributions.push(ComponentContribution {
                component: outcome.component,
                present: outcome.present,
                weight,
                raw_score: outcome.score,
                weighted_score: (product / u64::from(MAX_BASIS_POINTS)) as u32,
            });
            reason_codes.extend(outcome.reason);
        }

        // Two basis-point factors: 10000 · 10000 / 100 per final-score point.
        let final_score = ((weighted_total + 500_000) / 1_000_000).min(100) as u32;
        let passed = final_score >= self.config.pass_threshold;
        if !passed {
            reason_codes.push(ReasonCode::BelowPassThreshold);
        } else if reason_codes.is_empty() {
            reason_codes.push(ReasonCode::Success);
        }

        tracing::debug!(
            account = %inputs.account,
            block_height = inputs.block_height,
            input_hash = %input_hash,
            reasons = reason_codes.len(),
            "composite score computed"
        );

        Ok(CompositeScoreResult {
            account: inputs.account.clone(),
            final_score,
            passed,
            reason_codes,
            contributions,
            input_hash,
            score_version: COMPOSITE_SCORE_VERSION.to_string(),
            block_height: inputs.block_height,
            timestamp: inputs.timestamp,
        })
    }
}

/// Compute with the default configuration.
pub fn compute_composite_identity_score(
    inputs: &CompositeScoringInputs,
) -> Result<CompositeScoreResult, ScoringError> {
    ScoringEngine::default().compute(inputs)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::config::CompositeScoringWeights;

    #[test]
    fn all_max_inputs_pass() {
        let r = compute_composite_identity_score(&all_max()).unwrap();
        // Maximal risk zeroes the 5% risk component.
        assert_eq!(r.final_score, 95);
        assert!(r.passed);
        assert_eq!(r.reason_codes, vec![ReasonCode::HighRiskIndicators]);
    }

    #[test]
    fn ideal_inputs_score_100_with_success() {
        let r = compute_composite_identity_score(&ideal()).unwrap();
        assert_eq!(r.final_score, 100);
        assert_eq!(r.reason_codes, vec![ReasonCode::Success]);
    }

    #[test]
    fn all_min_inputs_fail() {
        let r = compute_composite_identity_score(&all_min()).unwrap();
        assert_eq!(r.final_score, 5);
        assert!(!r.passed);
        assert_eq!(r.reason_codes.last(), Some(&ReasonCode::BelowPassThreshold));
        assert!(r.reason_codes.contains(&ReasonCode::LowDocumentQuality));
        assert!(r.reason_codes.contains(&ReasonCode::LowFaceMatch));
        assert!(!r.reason_codes.contains(&ReasonCode::HighRiskIndicators));
    }

    #[test]
    fn everything_absent_scores_neutral() {
        let r = compute_composite_identity_score(&base()).unwrap();
        assert_eq!(r.final_score, 50);
        assert!(r.passed);
        assert_eq!(
            r.reason_codes,
            vec![
                ReasonCode::MissingDocument,
                ReasonCode::MissingSelfie,
                ReasonCode::MissingLiveness,
                ReasonCode::MissingDataConsistency,
                ReasonCode::NoHistoricalSignals,
                ReasonCode::MissingRiskAssessment,
            ]
        );
        assert!(r.contributions.iter().all(|c| c.raw_score == 5_000 && !c.present));
    }

    #[test]
    fn single_absent_component_is_neutral_not_zero() {
        let mut inputs = ideal();
        inputs.face_match.present = false;
        let r = compute_composite_identity_score(&inputs).unwrap();
        let face = &r.contributions[1];
        assert_eq!(face.component, ScoreComponent::FaceMatch);
        assert_eq!(face.raw_score, 5_000);
        assert_eq!(face.weighted_score, 1_250);
        // 100 − 25 · 0.5 = 87.5, rounded half up.
        assert_eq!(r.final_score, 88);
        assert_eq!(r.reason_codes, vec![ReasonCode::MissingSelfie]);
    }

    #[test]
    fn contributions_follow_component_order_and_weights() {
        let r = compute_composite_identity_score(&all_min()).unwrap();
        assert_eq!(r.contributions.len(), 6);
        let weights: Vec<u32> = r.contributions.iter().map(|c| c.weight).collect();
        assert_eq!(weights, vec![2_500, 2_500, 2_000, 1_500, 1_000, 500]);
        for (c, expected) in r.contributions.iter().zip(ScoreComponent::ALL) {
            assert_eq!(c.component, expected);
        }
    }

    #[test]
    fn repeated_computation_is_identical() {
        let inputs = all_max();
        let first = compute_composite_identity_score(&inputs).unwrap();
        for _ in 0..5 {
            assert_eq!(compute_composite_identity_score(&inputs).unwrap(), first);
        }
    }

    #[test]
    fn input_hash_is_sensitive_to_a_single_field() {
        let a = all_max();
        let mut b = all_max();
        b.face_match.similarity_score = 9_000;
        let ha = compute_composite_identity_score(&a).unwrap().input_hash;
        let hb = compute_composite_identity_score(&b).unwrap().input_hash;
        assert_ne!(ha, hb);
        assert_eq!(ha.as_bytes().len(), 32);
    }

    #[test]
    fn input_hash_covers_context_fields() {
        let a = base();
        let mut b = base();
        b.block_height += 1;
        let mut c = base();
        c.timestamp = Timestamp::from_epoch_secs(1_700_000_001).unwrap();
        assert_ne!(input_hash(&a).unwrap(), input_hash(&b).unwrap());
        assert_ne!(input_hash(&a).unwrap(), input_hash(&c).unwrap());
    }

    #[test]
    fn custom_threshold_changes_pass_only() {
        let engine = ScoringEngine::new(ScoringConfig {
            pass_threshold: 96,
            ..Default::default()
        })
        .unwrap();
        let r = engine.compute(&all_max()).unwrap();
        assert_eq!(r.final_score, 95);
        assert!(!r.passed);
        assert_eq!(r.reason_codes.last(), Some(&ReasonCode::BelowPassThreshold));
    }

    #[test]
    fn engine_refuses_invalid_weights() {
        let err = ScoringEngine::new(ScoringConfig {
            weights: CompositeScoringWeights {
                face_match: 0,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidWeights(7_500)));
    }

    #[test]
    fn out_of_range_metric_fails_computation() {
        let mut inputs = all_max();
        inputs.risk_indicators.velocity_risk = 20_000;
        assert!(matches!(
            compute_composite_identity_score(&inputs),
            Err(ScoringError::MetricOutOfRange { .. })
        ));
    }

    #[test]
    fn inputs_deserialize_with_missing_components() {
        let json = r#"{
            "account": "veid1bob",
            "block_height": 7,
            "timestamp": "2023-11-14T22:13:20Z",
            "face_match": {"present": true, "similarity_score": 9000, "quality_score": 8000}
        }"#;
        let inputs: CompositeScoringInputs = serde_json::from_str(json).unwrap();
        assert!(!inputs.document_authenticity.present);
        assert_eq!(inputs.face_match.compute_score(), 8_800);
    }
}

#[cfg(test)]
mod proptests {
    use super::fixtures::with_all;
    use super::*;
    use proptest::prelude::*;

    fn metric() -> impl Strategy<Value = u32> {
        0u32..=10_000
    }

    fn inputs() -> impl Strategy<Value = CompositeScoringInputs> {
        (
            prop::array::uniform6(any::<bool>()),
            prop::collection::vec(metric(), 16),
        )
            .prop_map(|(present, m)| {
                let mut i = with_all(0);
                i.document_authenticity = DocumentAuthenticityInput {
                    present: present[0],
                    authenticity_score: m[0],
                    ocr_confidence: m[1],
                    template_match: m[2],
                };
                i.face_match = FaceMatchInput {
                    present: present[1],
                    similarity_score: m[3],
                    quality_score: m[4],
                };
                i.liveness_detection = LivenessDetectionInput {
                    present: present[2],
                    liveness_score: m[5],
                    anti_spoof_score: m[6],
                };
                i.data_consistency = DataConsistencyInput {
                    present: present[3],
                    name_match: m[7],
                    dob_match: m[8],
                    document_field_match: m[9],
                };
                i.historical_signals = HistoricalSignalsInput {
                    present: present[4],
                    account_age_score: m[10],
                    prior_verification_score: m[11],
                    activity_score: m[12],
                };
                i.risk_indicators = RiskIndicatorsInput {
                    present: present[5],
                    fraud_risk: m[13],
                    device_risk: m[14],
                    velocity_risk: m[15],
                };
                i
            })
    }

    proptest! {
        #[test]
        fn final_score_is_bounded(i in inputs()) {
            let r = compute_composite_identity_score(&i).unwrap();
            prop_assert!(r.final_score <= 100);
            prop_assert_eq!(r.contributions.len(), 6);
            for c in &r.contributions {
                prop_assert!(c.raw_score <= MAX_BASIS_POINTS);
            }
        }

        #[test]
        fn computation_is_deterministic(i in inputs()) {
            let a = compute_composite_identity_score(&i).unwrap();
            let b = compute_composite_identity_score(&i).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn pass_and_reason_codes_agree(i in inputs()) {
            let r = compute_composite_identity_score(&i).unwrap();
            let below = r.reason_codes.contains(&ReasonCode::BelowPassThreshold);
            prop_assert_eq!(below, !r.passed);
            if r.reason_codes.contains(&ReasonCode::Success) {
                prop_assert_eq!(r.reason_codes.len(), 1);
            }
        }
    }
}
