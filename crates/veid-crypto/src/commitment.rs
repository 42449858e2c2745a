//! # Salted Hash Commitments
//!
//! `commit(domain, value, salt) = H("veid:commit" || domain || value || salt)`.
//!
//! Hiding rests on the salt: a verifier holding the commitment but not the
//! salt learns nothing short of enumerating the value domain together with
//! the salt space. Binding rests on SHA-256 collision resistance.

use subtle::ConstantTimeEq;
use veid_core::{domain_hash, CanonicalBytes, Digest32};

const COMMIT_DOMAIN: &str = "veid:commit";

/// Commit to raw bytes under a domain label.
pub fn commit(domain: &str, value: &[u8], salt: &[u8]) -> Digest32 {
    domain_hash(COMMIT_DOMAIN, &[domain.as_bytes(), value, salt])
}

/// Commit to canonicalized structured data.
pub fn commit_canonical(domain: &str, value: &CanonicalBytes, salt: &[u8]) -> Digest32 {
    commit(domain, value.as_bytes(), salt)
}

/// Constant-time digest equality.
pub fn ct_eq(a: &Digest32, b: &Digest32) -> bool {
    a.as_bytes()[..].ct_eq(&b.as_bytes()[..]).into()
}

/// Recompute and compare a commitment in constant time.
pub fn verify_commitment(expected: &Digest32, domain: &str, value: &[u8], salt: &[u8]) -> bool {
    ct_eq(expected, &commit(domain, value, salt))
}
