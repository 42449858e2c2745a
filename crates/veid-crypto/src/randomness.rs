//! # Deterministic Randomness Resolver
//!
//! Every validator re-executing a transaction must derive the same nonces
//! and salts. The resolver therefore has exactly two sources:
//!
//! 1. Bytes the caller supplied (e.g. a client that pre-committed a nonce in
//!    its transaction). Returned unchanged.
//! 2. `H(domain || context... || block_height)`, otherwise.
//!
//! Block height is used instead of block time: heights are agreed exactly,
//! times only within the proposer's tolerance.
//!
//! Each protocol step uses its own domain label from [`domains`], so equal
//! context bytes in two unrelated steps still yield unrelated outputs.

use serde::{Deserialize, Serialize};
use veid_core::encoding::hex_bytes_opt;
use veid_core::{BlockContext, Sha256Accumulator};

/// Domain labels, one per derivation site.
pub mod domains {
    /// Selective-disclosure request nonce.
    pub const SDR_NONCE: &str = "veid:sdr:nonce";
    /// Selective-disclosure proof nonce.
    pub const SDR_PROOF_NONCE: &str = "veid:sdr:proof_nonce";
    /// Salt for the disclosed-claims commitment hash.
    pub const SDR_COMMITMENT_SALT: &str = "veid:sdr:commitment_salt";
    /// Per-claim sub-nonce.
    pub const SDR_CLAIM_NONCE: &str = "veid:sdr:claim_nonce";
    /// Per-claim sub-salt.
    pub const SDR_CLAIM_SALT: &str = "veid:sdr:claim_salt";
    /// Age proof nonce.
    pub const AGE_NONCE: &str = "veid:age:nonce";
    /// Age proof commitment salt.
    pub const AGE_COMMITMENT_SALT: &str = "veid:age:commitment_salt";
    /// Residency proof nonce.
    pub const RESIDENCY_NONCE: &str = "veid:residency:nonce";
    /// Residency proof commitment salt.
    pub const RESIDENCY_COMMITMENT_SALT: &str = "veid:residency:commitment_salt";
    /// Score threshold proof nonce.
    pub const SCORE_NONCE: &str = "veid:score:nonce";
    /// Score threshold proof salt.
    pub const SCORE_SALT: &str = "veid:score:salt";
}

/// Optional caller-supplied randomness. Absent fields are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessInputs {
    /// Nonce for request or proof identifiers.
    #[serde(default, with = "hex_bytes_opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Vec<u8>>,
    /// Salt for commitment hashes.
    #[serde(default, with = "hex_bytes_opt", skip_serializing_if = "Option::is_none")]
    pub commitment_salt: Option<Vec<u8>>,
    /// Salt for score commitments.
    #[serde(default, with = "hex_bytes_opt", skip_serializing_if = "Option::is_none")]
    pub score_salt: Option<Vec<u8>>,
}

impl RandomnessInputs {
    /// No caller-supplied randomness: everything is derived.
    pub fn derived() -> Self {
        Self::default()
    }
}

/// Resolve `provided` or derive from `(domain, context, height)`.
///
/// An empty `provided` slice counts as absent.
pub fn resolve_random_bytes(
    provided: Option<&[u8]>,
    domain: &str,
    height: u64,
    context: &[&[u8]],
) -> Vec<u8> {
    if let Some(bytes) = provided.filter(|b| !b.is_empty()) {
        return bytes.to_vec();
    }
    let mut acc = Sha256Accumulator::with_domain(domain);
    for c in context {
        acc.field(c);
    }
    acc.field_u64(height);
    acc.finalize().as_bytes().to_vec()
}

/// Resolver bound to one block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomnessResolver {
    height: u64,
}

impl RandomnessResolver {
    /// Bind to a block height.
    pub fn new(height: u64) -> Self {
        Self { height }
    }

    /// Bind to the height of the executing block.
    pub fn for_block(ctx: &BlockContext) -> Self {
        Self::new(ctx.height)
    }

    /// The bound height.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// See [`resolve_random_bytes`].
    pub fn resolve(&self, provided: Option<&[u8]>, domain: &str, context: &[&[u8]]) -> Vec<u8> {
        resolve_random_bytes(provided, domain, self.height, context)
    }
}

fn derive_for_claim(label: &str, base: &[u8], claim: &str) -> Vec<u8> {
    let mut acc = Sha256Accumulator::with_domain(label);
    acc.field(claim.as_bytes()).field(base);
    acc.finalize().as_bytes().to_vec()
}

/// `H("veid:sdr:claim_nonce" || claim || base)`.
pub fn derive_claim_nonce(base: &[u8], claim: &str) -> Vec<u8> {
    derive_for_claim(domains::SDR_CLAIM_NONCE, base, claim)
}

/// `H("veid:sdr:claim_salt" || claim || base)`.
pub fn derive_claim_salt(base: &[u8], claim: &str) -> Vec<u8> {
    derive_for_claim(domains::SDR_CLAIM_SALT, base, claim)
}
