//! # veid-crypto: Cryptographic Primitives
//!
//! - **Randomness** (`randomness.rs`): the Deterministic Randomness Resolver.
//!   Every nonce and salt in the system is either supplied by the caller or
//!   derived from `(domain, context, block height)`. No entropy source is
//!   reachable from this crate.
//! - **Commitments** (`commitment.rs`): salted, domain-separated SHA-256
//!   commitments with constant-time comparison.
//! - **Pedersen** (`pedersen.rs`): `g^x·h^r` commitments over the
//!   multiplicative group modulo the Mersenne prime `2^61 − 1`, and a
//!   two-base Schnorr proof of knowledge of the opening.
//!
//! ## Security Budget
//!
//! The Pedersen group is 61 bits. It binds and hides against casual
//! inspection inside a consensus transcript, not against a dedicated
//! discrete-log attacker. Secrets committed here are small-domain values
//! (booleans, ages, scores, country codes) that a brute-forcer could enumerate
//! anyway.
//!
//! ## Crate Policy
//!
//! - Depends only on `veid-core` internally.
//! - All tests use real SHA-256 and real modular arithmetic, no mocks.

pub mod commitment;
pub mod error;
pub mod pedersen;
pub mod randomness;

pub use commitment::{commit, commit_canonical, ct_eq, verify_commitment};
pub use error::CryptoError;
pub use pedersen::{KnowledgeProof, PedersenCommitment, Scalar};
pub use randomness::{
    derive_claim_nonce, derive_claim_salt, resolve_random_bytes, RandomnessInputs,
    RandomnessResolver,
};
