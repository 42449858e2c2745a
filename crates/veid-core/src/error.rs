//! # Error Types
//!
//! Leaf error types shared across the workspace. Crate-level error enums in
//! `veid-scoring` and `veid-disclosure` wrap these with `#[from]`.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A domain primitive failed validation at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account address is empty, too long, or contains illegal characters.
    #[error("invalid account address {0:?}: {1}")]
    InvalidAddress(String, &'static str),

    /// Country code is not an ISO-3166 alpha-2 upper-case code.
    #[error("invalid country code {0:?}: expected two upper-case ASCII letters")]
    InvalidCountryCode(String),

    /// Digest is not 64 lowercase hex characters.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Timestamp could not be parsed or is out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Error at the key-value store seam.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A stored value could not be encoded.
    #[error("failed to encode value for key {key}: {source}")]
    Encode {
        /// Printable form of the key.
        key: String,
        /// Underlying cause.
        source: CanonicalizationError,
    },

    /// A stored value could not be decoded.
    #[error("failed to decode value at key {key}: {source}")]
    Decode {
        /// Printable form of the key.
        key: String,
        /// Underlying cause.
        source: serde_json::Error,
    },
}
