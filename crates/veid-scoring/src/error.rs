//! # Scoring Errors

use thiserror::Error;
use veid_core::{CanonicalizationError, StoreError};

/// Error raised by configuration validation or score computation.
#[derive(Error, Debug)]
pub enum ScoringError {
    /// Component weights do not sum to 10000 basis points.
    #[error("scoring weights must sum to 10000 basis points, got {0}")]
    InvalidWeights(u32),

    /// Pass threshold is outside `[0, 100]`.
    #[error("pass threshold must be within [0, 100], got {0}")]
    InvalidPassThreshold(u32),

    /// A sub-metric exceeds 10000 basis points.
    #[error("{component}.{field} = {value} exceeds 10000 basis points")]
    MetricOutOfRange {
        /// Component carrying the metric.
        component: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: u32,
    },

    /// Inputs could not be canonicalized for the input hash.
    #[error("input canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The score store rejected a read or write.
    #[error("score store: {0}")]
    Store(#[from] StoreError),
}
