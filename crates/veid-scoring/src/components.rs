//! # Score Components
//!
//! The six signal categories of the composite score. Every component carries
//! a `present` flag and raw sub-metrics in basis points `[0, 10000]`, and
//! reduces them to a component score in the same range.
//!
//! An absent component scores [`NEUTRAL_SCORE`], not zero, so a subject
//! missing one signal can still pass on the strength of the others. The
//! absence is always recorded as a reason code.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// Upper bound of every sub-metric and component score.
pub const MAX_BASIS_POINTS: u32 = 10_000;

/// Component score used when a component is absent.
pub const NEUTRAL_SCORE: u32 = 5_000;

// ---------------------------------------------------------------------------
// Component and reason-code enums
// ---------------------------------------------------------------------------

/// The six composite-score components, in contribution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    /// Identity document checks.
    DocumentAuthenticity,
    /// Selfie against document photo.
    FaceMatch,
    /// Presentation-attack detection.
    LivenessDetection,
    /// Cross-field consistency.
    DataConsistency,
    /// Account history.
    HistoricalSignals,
    /// Fraud, device and velocity risk.
    RiskIndicators,
}

impl ScoreComponent {
    /// All components in contribution order.
    pub const ALL: [Self; 6] = [
        Self::DocumentAuthenticity,
        Self::FaceMatch,
        Self::LivenessDetection,
        Self::DataConsistency,
        Self::HistoricalSignals,
        Self::RiskIndicators,
    ];

    /// Snake-case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentAuthenticity => "document_authenticity",
            Self::FaceMatch => "face_match",
            Self::LivenessDetection => "liveness_detection",
            Self::DataConsistency => "data_consistency",
            Self::HistoricalSignals => "historical_signals",
            Self::RiskIndicators => "risk_indicators",
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auditable cause attached to a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// No document signal.
    MissingDocument,
    /// Document score below 6000.
    LowDocumentQuality,
    /// No selfie / face-match signal.
    MissingSelfie,
    /// Face similarity below 7000.
    LowFaceMatch,
    /// No liveness signal.
    MissingLiveness,
    /// Liveness score below 7000.
    LivenessCheckFailed,
    /// No data-consistency signal.
    MissingDataConsistency,
    /// Consistency score below 6000.
    InconsistentData,
    /// No historical signal.
    NoHistoricalSignals,
    /// History score below 3000.
    InsufficientHistory,
    /// No risk assessment.
    MissingRiskAssessment,
    /// Risk score below 5000.
    HighRiskIndicators,
    /// Final score below the pass threshold.
    BelowPassThreshold,
    /// Passed with no other reason codes.
    Success,
}

// ---------------------------------------------------------------------------
// Component inputs
// ---------------------------------------------------------------------------

/// Common behaviour of the six component inputs.
pub trait ComponentInput {
    /// Which component this is.
    const COMPONENT: ScoreComponent;
    /// Reason code when absent.
    const MISSING: ReasonCode;
    /// Reason code when present but below the sub-threshold.
    const LOW: ReasonCode;

    /// Whether the signal was collected.
    fn present(&self) -> bool;

    /// Reject sub-metrics above [`MAX_BASIS_POINTS`].
    fn validate(&self) -> Result<(), ScoringError>;

    /// Score when present. Callers use [`ComponentInput::compute_score`].
    fn raw_score(&self) -> u32;

    /// Whether a present signal falls below the component's sub-threshold.
    fn below_threshold(&self) -> bool;

    /// Component score in basis points; [`NEUTRAL_SCORE`] when absent.
    fn compute_score(&self) -> u32 {
        if self.present() {
            self.raw_score().min(MAX_BASIS_POINTS)
        } else {
            NEUTRAL_SCORE
        }
    }

    /// The reason code this component contributes, if any.
    fn reason(&self) -> Option<ReasonCode> {
        if !self.present() {
            Some(Self::MISSING)
        } else if self.below_threshold() {
            Some(Self::LOW)
        } else {
            None
        }
    }
}

fn check(component: ScoreComponent, field: &'static str, value: u32) -> Result<(), ScoringError> {
    if value > MAX_BASIS_POINTS {
        return Err(ScoringError::MetricOutOfRange {
            component: component.as_str(),
            field,
            value,
        });
    }
    Ok(())
}

fn mean(values: &[u32]) -> u32 {
    let sum: u64 = values.iter().map(|v| u64::from(*v)).sum();
    (sum / values.len() as u64) as u32
}

/// Document authenticity sub-metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentAuthenticityInput {
    pub present: bool,
    pub authenticity_score: u32,
    pub ocr_confidence: u32,
    pub template_match: u32,
}

impl ComponentInput for DocumentAuthenticityInput {
    const COMPONENT: ScoreComponent = ScoreComponent::DocumentAuthenticity;
    const MISSING: ReasonCode = ReasonCode::MissingDocument;
    const LOW: ReasonCode = ReasonCode::LowDocumentQuality;

    fn present(&self) -> bool {
        self.present
    }

    fn validate(&self) -> Result<(), ScoringError> {
        check(Self::COMPONENT, "authenticity_score", self.authenticity_score)?;
        check(Self::COMPONENT, "ocr_confidence", self.ocr_confidence)?;
        check(Self::COMPONENT, "template_match", self.template_match)
    }

    fn raw_score(&self) -> u32 {
        let weighted = 50 * u64::from(self.authenticity_score)
            + 25 * u64::from(self.ocr_confidence)
            + 25 * u64::from(self.template_match);
        (weighted / 100) as u32
    }

    fn below_threshold(&self) -> bool {
        self.raw_score() < 6_000
    }
}

/// Face match sub-metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceMatchInput {
    pub present: bool,
    pub similarity_score: u32,
    pub quality_score: u32,
}

impl ComponentInput for FaceMatchInput {
    const COMPONENT: ScoreComponent = ScoreComponent::FaceMatch;
    const MISSING: ReasonCode = ReasonCode::MissingSelfie;
    const LOW: ReasonCode = ReasonCode::LowFaceMatch;

    fn present(&self) -> bool {
        self.present
    }

    fn validate(&self) -> Result<(), ScoringError> {
        check(Self::COMPONENT, "similarity_score", self.similarity_score)?;
        check(Self::COMPONENT, "quality_score", self.quality_score)
    }

    fn raw_score(&self) -> u32 {
        let weighted = 80 * u64::from(self.similarity_score) + 20 * u64::from(self.quality_score);
        (weighted / 100) as u32
    }

    // Gated on similarity alone; a sharp photo of the wrong face still fails.
    fn below_threshold(&self) -> bool {
        self.similarity_score < 7_000
    }
}

/// Liveness sub-metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessDetectionInput {
    pub present: bool,
    pub liveness_score: u32,
    pub anti_spoof_score: u32,
}

impl ComponentInput for LivenessDetectionInput {
    const COMPONENT: ScoreComponent = ScoreComponent::LivenessDetection;
    const MISSING: ReasonCode = ReasonCode::MissingLiveness;
    const LOW: ReasonCode = ReasonCode::LivenessCheckFailed;

    fn present(&self) -> bool {
        self.present
    }

    fn validate(&self) -> Result<(), ScoringError> {
        check(Self::COMPONENT, "liveness_score", self.liveness_score)?;
        check(Self::COMPONENT, "anti_spoof_score", self.anti_spoof_score)
    }

    fn raw_score(&self) -> u32 {
        mean(&[self.liveness_score, self.anti_spoof_score])
    }

    fn below_threshold(&self) -> bool {
        self.raw_score() < 7_000
    }
}

/// Data consistency sub-metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConsistencyInput {
    pub present: bool,
    pub name_match: u32,
    pub dob_match: u32,
    pub document_field_match: u32,
}

impl ComponentInput for DataConsistencyInput {
    const COMPONENT: ScoreComponent = ScoreComponent::DataConsistency;
    const MISSING: ReasonCode = ReasonCode::MissingDataConsistency;
    const LOW: ReasonCode = ReasonCode::InconsistentData;

    fn present(&self) -> bool {
        self.present
    }

    fn validate(&self) -> Result<(), ScoringError> {
        check(Self::COMPONENT, "name_match", self.name_match)?;
        check(Self::COMPONENT, "dob_match", self.dob_match)?;
        check(Self::COMPONENT, "document_field_match", self.document_field_match)
    }

    fn raw_score(&self) -> u32 {
        mean(&[self.name_match, self.dob_match, self.document_field_match])
    }

    fn below_threshold(&self) -> bool {
        self.raw_score() < 6_000
    }
}

/// Historical sub-metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalSignalsInput {
    pub present: bool,
    pub account_age_score: u32,
    pub prior_verification_score: u32,
    pub activity_score: u32,
}

impl ComponentInput for HistoricalSignalsInput {
    const COMPONENT: ScoreComponent = ScoreComponent::HistoricalSignals;
    const MISSING: ReasonCode = ReasonCode::NoHistoricalSignals;
    const LOW: ReasonCode = ReasonCode::InsufficientHistory;

    fn present(&self) -> bool {
        self.present
    }

    fn validate(&self) -> Result<(), ScoringError> {
        check(Self::COMPONENT, "account_age_score", self.account_age_score)?;
        check(Self::COMPONENT, "prior_verification_score", self.prior_verification_score)?;
        check(Self::COMPONENT, "activity_score", self.activity_score)
    }

    fn raw_score(&self) -> u32 {
        mean(&[
            self.account_age_score,
            self.prior_verification_score,
            self.activity_score,
        ])
    }

    fn below_threshold(&self) -> bool {
        self.raw_score() < 3_000
    }
}

/// Risk sub-metrics. Higher means riskier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskIndicatorsInput {
    pub present: bool,
    pub fraud_risk: u32,
    pub device_risk: u32,
    pub velocity_risk: u32,
}

impl ComponentInput for RiskIndicatorsInput {
    const COMPONENT: ScoreComponent = ScoreComponent::RiskIndicators;
    const MISSING: ReasonCode = ReasonCode::MissingRiskAssessment;
    const LOW: ReasonCode = ReasonCode::HighRiskIndicators;

    fn present(&self) -> bool {
        self.present
    }

    fn validate(&self) -> Result<(), ScoringError> {
        check(Self::COMPONENT, "fraud_risk", self.fraud_risk)?;
        check(Self::COMPONENT, "device_risk", self.device_risk)?;
        check(Self::COMPONENT, "velocity_risk", self.velocity_risk)
    }

    // The worst single risk dominates.
    fn raw_score(&self) -> u32 {
        let worst = self.fraud_risk.max(self.device_risk).max(self.velocity_risk);
        MAX_BASIS_POINTS.saturating_sub(worst)
    }

    fn below_threshold(&self) -> bool {
        self.raw_score() < 5_000
    }
}
