//! # Scoring Configuration
//!
//! Weights and the pass threshold are validated once, when a
//! [`ScoringEngine`](crate::ScoringEngine) is built. An engine cannot exist
//! with weights that fail to sum to 10000, so score computation never
//! re-checks them.

use serde::{Deserialize, Serialize};

use crate::components::{ScoreComponent, MAX_BASIS_POINTS};
use crate::error::ScoringError;

/// Default pass threshold on the final `[0, 100]` score.
pub const DEFAULT_PASS_THRESHOLD: u32 = 50;

/// Basis-point weight per component. Must sum to exactly 10000.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeScoringWeights {
    pub document_authenticity: u32,
    pub face_match: u32,
    pub liveness_detection: u32,
    pub data_consistency: u32,
    pub historical_signals: u32,
    pub risk_indicators: u32,
}

impl Default for CompositeScoringWeights {
    fn default() -> Self {
        Self {
            document_authenticity: 2_500,
            face_match: 2_500,
            liveness_detection: 2_000,
            data_consistency: 1_500,
            historical_signals: 1_000,
            risk_indicators: 500,
        }
    }
}

impl CompositeScoringWeights {
    /// Weight for one component.
    pub fn weight(&self, component: ScoreComponent) -> u32 {
        match component {
            ScoreComponent::DocumentAuthenticity => self.document_authenticity,
            ScoreComponent::FaceMatch => self.face_match,
            ScoreComponent::LivenessDetection => self.liveness_detection,
            ScoreComponent::DataConsistency => self.data_consistency,
            ScoreComponent::HistoricalSignals => self.historical_signals,
            ScoreComponent::RiskIndicators => self.risk_indicators,
        }
    }

    /// Sum of all weights, widened so overflow cannot mask a bad config.
    pub fn total(&self) -> u64 {
        ScoreComponent::ALL
            .iter()
            .map(|c| u64::from(self.weight(*c)))
            .sum()
    }

    /// Require the weights to sum to exactly 10000.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let total = self.total();
        if total != u64::from(MAX_BASIS_POINTS) {
            return Err(ScoringError::InvalidWeights(
                u32::try_from(total).unwrap_or(u32::MAX),
            ));
        }
        Ok(())
    }
}

/// Scoring engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Component weights.
    pub weights: CompositeScoringWeights,
    /// Minimum final score that passes.
    pub pass_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: CompositeScoringWeights::default(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

impl ScoringConfig {
    /// Check weights and threshold.
    pub fn validate(&self) -> Result<(), ScoringError> {
        self.weights.validate()?;
        if self.pass_threshold > 100 {
            return Err(ScoringError::InvalidPassThreshold(self.pass_threshold));
        }
        Ok(())
    }
}
