//! # Digests: Domain-Separated SHA-256
//!
//! Two digest paths exist:
//!
//! - [`sha256_digest()`] hashes [`CanonicalBytes`] for structured data
//!   (score inputs, disclosed claims, proof bundles).
//! - [`Sha256Accumulator`] hashes framed binary fields for protocol
//!   derivations (nonces, salts, commitments, challenges).
//!
//! ## Framing
//!
//! `field(bytes)` writes `len(bytes) as u64 big-endian || bytes`. Every
//! derivation starts with its domain label as the first field, so
//! `("veid:sdr:nonce", ctx)` and `("veid:age:commitment_salt", ctx)` can
//! never collide even when `ctx` is identical.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::ValidationError;

/// A 32-byte SHA-256 digest, serialized as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest32([u8; 32]);

impl Digest32 {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from exactly 64 lowercase hex characters.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let bytes = crate::encoding::decode_canonical_hex(s)
            .map_err(|e| ValidationError::InvalidDigest(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            ValidationError::InvalidDigest(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl From<[u8; 32]> for Digest32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Digest32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 over canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> Digest32 {
    let hash = Sha256::digest(data.as_bytes());
    Digest32(hash.into())
}

/// Incremental SHA-256 with length-prefixed field framing.
#[derive(Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator whose first field is the domain label.
    pub fn with_domain(domain: &str) -> Self {
        let mut acc = Self::new();
        acc.field(domain.as_bytes());
        acc
    }

    /// Append a framed field: `len_be64 || bytes`.
    pub fn field(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
        self
    }

    /// Append an unsigned integer as a framed 8-byte big-endian field.
    pub fn field_u64(&mut self, value: u64) -> &mut Self {
        self.field(&value.to_be_bytes())
    }

    /// Append a signed integer as a framed 8-byte big-endian field.
    pub fn field_i64(&mut self, value: i64) -> &mut Self {
        self.field(&value.to_be_bytes())
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> Digest32 {
        Digest32(self.hasher.finalize().into())
    }
}

impl fmt::Debug for Sha256Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sha256Accumulator")
    }
}

/// `H(domain || fields...)` with every element framed.
pub fn domain_hash(domain: &str, fields: &[&[u8]]) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(domain);
    for f in fields {
        acc.field(f);
    }
    acc.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_digest_of_empty_object_is_known_vector() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn framing_separates_field_boundaries() {
        let a = domain_hash("veid:test", &[b"ab", b"c"]);
        let b = domain_hash("veid:test", &[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_domains_never_collide() {
        let ctx: &[u8] = b"same context";
        assert_ne!(
            domain_hash("veid:sdr:nonce", &[ctx]),
            domain_hash("veid:age:commitment_salt", &[ctx])
        );
    }

    #[test]
    fn accumulator_matches_domain_hash() {
        let mut acc = Sha256Accumulator::with_domain("veid:test");
        acc.field(b"x").field_u64(7);
        assert_eq!(acc.finalize(), domain_hash("veid:test", &[b"x", &7u64.to_be_bytes()]));
    }

    #[test]
    fn hex_roundtrip_and_rejects_uppercase() {
        let d = domain_hash("veid:test", &[]);
        assert_eq!(Digest32::from_hex(&d.to_hex()).unwrap(), d);
        assert!(Digest32::from_hex(&d.to_hex().to_uppercase()).is_err());
        assert!(Digest32::from_hex("abcd").is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let d = domain_hash("veid:test", &[b"1"]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let back: Digest32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
