//! # Disclosure Configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bundle format version this crate writes and accepts.
pub const BUNDLE_VERSION: u32 = 1;

/// Invalid disclosure configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration is zero or negative.
    #[error("{0} must be positive")]
    NonPositive(&'static str),

    /// The bundle version is not one this build understands.
    #[error("unsupported bundle version {0} (supported: {BUNDLE_VERSION})")]
    UnsupportedBundleVersion(u32),
}

/// Settings of the selective-disclosure engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisclosureConfig {
    /// Request lifetime when the caller passes a non-positive expiry.
    pub default_request_expiry_secs: i64,
    /// Longest validity window a proof may request.
    pub max_validity_secs: i64,
    /// Version stamped on generated bundles.
    pub bundle_version: u32,
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        Self {
            default_request_expiry_secs: 86_400,
            max_validity_secs: 31_536_000,
            bundle_version: BUNDLE_VERSION,
        }
    }
}

impl DisclosureConfig {
    /// Check durations and version.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_request_expiry_secs <= 0 {
            return Err(ConfigError::NonPositive("default_request_expiry_secs"));
        }
        if self.max_validity_secs <= 0 {
            return Err(ConfigError::NonPositive("max_validity_secs"));
        }
        if self.bundle_version != BUNDLE_VERSION {
            return Err(ConfigError::UnsupportedBundleVersion(self.bundle_version));
        }
        Ok(())
    }
}
