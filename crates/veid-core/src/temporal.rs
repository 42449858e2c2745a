//! # Temporal Types: Block-Derived Time
//!
//! [`Timestamp`] is UTC-only with seconds precision and always renders as
//! `YYYY-MM-DDTHH:MM:SSZ`. There is no `Timestamp::now()`:
//! time enters the core only through [`BlockContext`], which the host fills
//! from the block header so every validator sees the same value.
//!
//! Block *time* is used for validity windows (request expiry, proof expiry).
//! Block *height* is used for randomness derivation, since proposers may
//! disagree on time by a few seconds but never on height.

use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create from Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp(format!("epoch {secs} out of range")))
    }

    /// Create from a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| ValidationError::InvalidTimestamp(format!("{s:?}: {e}")))?;
        Ok(Self::from_utc(dt.with_timezone(&Utc)))
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Add a duration, returning `None` on overflow.
    pub fn checked_add(&self, d: Duration) -> Option<Self> {
        self.0.checked_add_signed(d).map(Self)
    }

    /// Canonical `YYYY-MM-DDTHH:MM:SSZ` rendering.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The block the current transaction executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block height. Feeds randomness derivation.
    pub height: u64,
    /// Block header time. Feeds validity windows only.
    pub time: Timestamp,
}

impl BlockContext {
    /// Construct a block context.
    pub fn new(height: u64, time: Timestamp) -> Self {
        Self { height, time }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_roundtrip() {
        let t = Timestamp::from_epoch_secs(1_700_000_000).unwrap();
        assert_eq!(t.epoch_secs(), 1_700_000_000);
        assert_eq!(t.to_iso8601(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn parse_rejects_offsets() {
        assert!(Timestamp::parse("2023-11-14T22:13:20Z").is_ok());
        assert!(Timestamp::parse("2023-11-14T22:13:20+00:00").is_err());
        assert!(Timestamp::parse("not a time").is_err());
    }

    #[test]
    fn parse_truncates_sub_seconds() {
        let t = Timestamp::parse("2023-11-14T22:13:20.987Z").unwrap();
        assert_eq!(t.to_iso8601(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn checked_add_moves_forward() {
        let t = Timestamp::from_epoch_secs(0).unwrap();
        let later = t.checked_add(Duration::hours(24)).unwrap();
        assert_eq!(later.epoch_secs(), 86_400);
        assert!(later > t);
    }

    #[test]
    fn serde_uses_iso8601() {
        let ctx = BlockContext::new(42, Timestamp::from_epoch_secs(86_400).unwrap());
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"height":42,"time":"1970-01-02T00:00:00Z"}"#);
        let back: BlockContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
