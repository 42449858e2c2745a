//! # Pedersen Commitments and Knowledge-of-Opening Proofs
//!
//! Group: the multiplicative group of integers modulo the Mersenne prime
//! `p = 2^61 − 1`. Exponents live modulo `p − 1`, so `g^(a + b mod (p−1))`
//! equals `g^a · g^b` for every base.
//!
//! - Commitment: `C = g^x · h^r mod p`.
//! - Proof of knowledge of `(x, r)`: announcement `A = g^k1 · h^k2`,
//!   challenge `e = H(domain || C || A) mod (p−1)`, responses
//!   `s1 = k1 + e·x`, `s2 = k2 + e·r`. Verification checks
//!   `g^s1 · h^s2 == A · C^e`.
//!
//! The nonces `k1`, `k2` are derived from the caller's nonce together with
//! the secret opening, so re-using a nonce across two different secrets
//! never re-uses `k`.
//!
//! `h` is hashed to the group from a fixed label; nobody knows `log_g(h)`.
//!
//! Group elements and scalars cross the wire as 16-character lowercase hex,
//! not JSON numbers, because canonical JSON numbers lose precision above
//! 2^53.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use veid_core::{Digest32, Sha256Accumulator};

use crate::error::CryptoError;

/// The prime modulus `2^61 − 1`.
pub const MODULUS: u64 = (1u64 << 61) - 1;

/// Exponent modulus `p − 1`.
pub const EXPONENT_MODULUS: u64 = MODULUS - 1;

const GENERATOR_G: u64 = 37;
const GENERATOR_H_LABEL: &str = "veid:pedersen:generator_h";
const CHALLENGE_DOMAIN: &str = "veid:pedersen:challenge";
const NONCE_DOMAIN: &str = "veid:pedersen:nonce";

fn mul_mod(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) % MODULUS as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64) -> u64 {
    let mut acc = 1u64;
    base %= MODULUS;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base);
        }
        base = mul_mod(base, base);
        exp >>= 1;
    }
    acc
}

fn generator_h() -> u64 {
    let mut counter = 0u64;
    loop {
        let mut acc = Sha256Accumulator::with_domain(GENERATOR_H_LABEL);
        acc.field_u64(counter);
        let candidate = reduce(&acc.finalize(), MODULUS);
        if candidate > 1 && candidate != GENERATOR_G {
            return candidate;
        }
        counter += 1;
    }
}

fn reduce(digest: &Digest32, modulus: u64) -> u64 {
    let mut wide = [0u8; 16];
    wide.copy_from_slice(&digest.as_bytes()[..16]);
    (u128::from_be_bytes(wide) % modulus as u128) as u64
}

/// An exponent in `[0, p − 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scalar(u64);

impl Scalar {
    /// Reduce a digest into a scalar.
    pub fn from_digest(digest: &Digest32) -> Self {
        Self(reduce(digest, EXPONENT_MODULUS))
    }

    /// Hash arbitrary bytes under a domain label into a scalar.
    pub fn derive(domain: &str, parts: &[&[u8]]) -> Self {
        Self::from_digest(&veid_core::domain_hash(domain, parts))
    }

    /// Validate a raw value.
    pub fn new(value: u64) -> Result<Self, CryptoError> {
        if value >= EXPONENT_MODULUS {
            return Err(CryptoError::InvalidGroupElement(format!(
                "scalar {value} not below exponent modulus"
            )));
        }
        Ok(Self(value))
    }

    /// The raw value.
    pub fn value(&self) -> u64 {
        self.0
    }

    fn add(self, other: Self) -> Self {
        Self(((self.0 as u128 + other.0 as u128) % EXPONENT_MODULUS as u128) as u64)
    }

    fn mul(self, other: Self) -> Self {
        Self(((self.0 as u128 * other.0 as u128) % EXPONENT_MODULUS as u128) as u64)
    }
}

/// A Pedersen commitment `g^x · h^r mod p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedersenCommitment(u64);

impl PedersenCommitment {
    /// Commit to `value` with `blinding`.
    pub fn commit(value: Scalar, blinding: Scalar) -> Self {
        Self(mul_mod(
            pow_mod(GENERATOR_G, value.0),
            pow_mod(generator_h(), blinding.0),
        ))
    }

    /// Validate a raw group element.
    pub fn from_element(element: u64) -> Result<Self, CryptoError> {
        if element == 0 || element >= MODULUS {
            return Err(CryptoError::InvalidGroupElement(format!(
                "element {element} outside [1, p)"
            )));
        }
        Ok(Self(element))
    }

    /// The raw group element.
    pub fn element(&self) -> u64 {
        self.0
    }

    /// Big-endian bytes, as fed into transcripts.
    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for PedersenCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Two-base Schnorr proof of knowledge of a Pedersen opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeProof {
    /// `A = g^k1 · h^k2`.
    #[serde(with = "hex_u64")]
    pub announcement: u64,
    /// `s1 = k1 + e·x`.
    #[serde(with = "hex_u64")]
    pub response_value: u64,
    /// `s2 = k2 + e·r`.
    #[serde(with = "hex_u64")]
    pub response_blinding: u64,
}

fn challenge(domain: &str, commitment: &PedersenCommitment, announcement: u64) -> Scalar {
    let mut acc = Sha256Accumulator::with_domain(CHALLENGE_DOMAIN);
    acc.field(domain.as_bytes())
        .field(&commitment.to_bytes())
        .field_u64(announcement);
    Scalar::from_digest(&acc.finalize())
}

impl KnowledgeProof {
    /// Prove knowledge of `(value, blinding)` opening `commitment`.
    pub fn prove(
        domain: &str,
        commitment: &PedersenCommitment,
        value: Scalar,
        blinding: Scalar,
        nonce: &[u8],
    ) -> Self {
        let k1 = Scalar::derive(
            NONCE_DOMAIN,
            &[b"k1", nonce, domain.as_bytes(), &value.0.to_be_bytes(), &blinding.0.to_be_bytes()],
        );
        let k2 = Scalar::derive(
            NONCE_DOMAIN,
            &[b"k2", nonce, domain.as_bytes(), &value.0.to_be_bytes(), &blinding.0.to_be_bytes()],
        );
        let announcement = mul_mod(pow_mod(GENERATOR_G, k1.0), pow_mod(generator_h(), k2.0));
        let e = challenge(domain, commitment, announcement);
        Self {
            announcement,
            response_value: k1.add(e.mul(value)).0,
            response_blinding: k2.add(e.mul(blinding)).0,
        }
    }

    /// Check the proof against a commitment and domain label.
    pub fn verify(&self, domain: &str, commitment: &PedersenCommitment) -> bool {
        if self.announcement == 0 || self.announcement >= MODULUS {
            return false;
        }
        if self.response_value >= EXPONENT_MODULUS || self.response_blinding >= EXPONENT_MODULUS {
            return false;
        }
        let e = challenge(domain, commitment, self.announcement);
        let lhs = mul_mod(
            pow_mod(GENERATOR_G, self.response_value),
            pow_mod(generator_h(), self.response_blinding),
        );
        let rhs = mul_mod(self.announcement, pow_mod(commitment.0, e.0));
        lhs == rhs
    }
}

mod hex_u64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:016x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(serde::de::Error::custom(format!(
                "expected 16 lowercase hex characters, got {s:?}"
            )));
        }
        u64::from_str_radix(&s, 16).map_err(serde::de::Error::custom)
    }
}

impl Serialize for PedersenCommitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_u64::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for PedersenCommitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = hex_u64::deserialize(deserializer)?;
        Self::from_element(raw).map_err(serde::de::Error::custom)
    }
}
