//! # Range Proofs
//!
//! Proves `value >= lower_bound` for an 8-bit secret value. The difference
//! `delta = value − lower_bound` is decomposed into bits, each bit is
//! committed with a blinding factor derived from the salt and nonce, and a
//! Fiat–Shamir challenge binds the domain, the value commitment, the public
//! bound and every bit commitment. The seal binds the challenge to the
//! per-bit responses.
//!
//! Verification recomputes the challenge and seal from the proof's public
//! fields and compares in constant time. A proof whose public bound differs
//! from the verifier's expected bound is rejected before any hashing.

use serde::{Deserialize, Serialize};
use veid_core::{Digest32, Sha256Accumulator};
use veid_crypto::{commit, ct_eq};

use crate::traits::{ProofError, VerifyError};

/// Bit length of the proven difference.
pub const RANGE_BIT_LENGTH: u8 = 8;

const MAX_VALUE: u64 = (1u64 << RANGE_BIT_LENGTH) - 1;

const BLIND_DOMAIN: &str = "veid:range:blind";
const BIT_DOMAIN: &str = "veid:range:bit";
const CHALLENGE_DOMAIN: &str = "veid:range:challenge";
const RESPONSE_DOMAIN: &str = "veid:range:response";
const SEAL_DOMAIN: &str = "veid:range:seal";

/// A proof that a committed value is at least `lower_bound`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProof {
    /// `commit(domain, value, salt)`.
    pub commitment: Digest32,
    /// The public lower bound.
    pub lower_bound: u64,
    /// Number of bits in the decomposition.
    pub bit_length: u8,
    /// One commitment per bit of `value − lower_bound`.
    pub bit_commitments: Vec<Digest32>,
    /// Fiat–Shamir challenge.
    pub challenge: Digest32,
    /// One response per bit.
    pub responses: Vec<Digest32>,
    /// Binds challenge and responses.
    pub seal: Digest32,
}

fn blind(salt: &[u8], nonce: &[u8], index: u8) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(BLIND_DOMAIN);
    acc.field(salt).field(nonce).field(&[index]);
    acc.finalize()
}

fn bit_commitment(domain: &str, index: u8, bit: u8, blind: &Digest32) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(BIT_DOMAIN);
    acc.field(domain.as_bytes())
        .field(&[index])
        .field(&[bit])
        .field(blind.as_bytes());
    acc.finalize()
}

fn response(challenge: &Digest32, index: u8, blind: &Digest32, bit: u8) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(RESPONSE_DOMAIN);
    acc.field(challenge.as_bytes())
        .field(&[index])
        .field(blind.as_bytes())
        .field(&[bit]);
    acc.finalize()
}

fn challenge(
    domain: &str,
    commitment: &Digest32,
    lower_bound: u64,
    bit_length: u8,
    bit_commitments: &[Digest32],
) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(CHALLENGE_DOMAIN);
    acc.field(domain.as_bytes())
        .field(commitment.as_bytes())
        .field_u64(lower_bound)
        .field(&[bit_length]);
    for c in bit_commitments {
        acc.field(c.as_bytes());
    }
    acc.finalize()
}

fn seal(challenge: &Digest32, responses: &[Digest32]) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(SEAL_DOMAIN);
    acc.field(challenge.as_bytes());
    for r in responses {
        acc.field(r.as_bytes());
    }
    acc.finalize()
}

impl RangeProof {
    /// Generate a proof that `value >= lower_bound`.
    ///
    /// Refuses when the statement is false, or when either number exceeds
    /// the 8-bit domain.
    pub fn generate(
        domain: &str,
        value: u64,
        lower_bound: u64,
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<Self, ProofError> {
        if value > MAX_VALUE || lower_bound > MAX_VALUE {
            return Err(ProofError::OutOfRange(format!(
                "range proofs cover values up to {MAX_VALUE}"
            )));
        }
        if value < lower_bound {
            return Err(ProofError::StatementFalse(
                "value is below the lower bound".into(),
            ));
        }
        let delta = value - lower_bound;
        let commitment = commit(domain, &value.to_be_bytes(), salt);

        let mut blinds = Vec::with_capacity(RANGE_BIT_LENGTH as usize);
        let mut bits = Vec::with_capacity(RANGE_BIT_LENGTH as usize);
        let mut bit_commitments = Vec::with_capacity(RANGE_BIT_LENGTH as usize);
        for i in 0..RANGE_BIT_LENGTH {
            let bit = ((delta >> i) & 1) as u8;
            let b = blind(salt, nonce, i);
            bit_commitments.push(bit_commitment(domain, i, bit, &b));
            blinds.push(b);
            bits.push(bit);
        }

        let challenge = challenge(domain, &commitment, lower_bound, RANGE_BIT_LENGTH, &bit_commitments);
        let responses: Vec<Digest32> = (0..RANGE_BIT_LENGTH)
            .map(|i| response(&challenge, i, &blinds[i as usize], bits[i as usize]))
            .collect();
        let seal = seal(&challenge, &responses);

        Ok(Self {
            commitment,
            lower_bound,
            bit_length: RANGE_BIT_LENGTH,
            bit_commitments,
            challenge,
            responses,
            seal,
        })
    }

    /// Check the proof against the bound the verifier expects.
    pub fn verify(&self, domain: &str, expected_lower_bound: u64) -> Result<(), VerifyError> {
        if self.bit_length != RANGE_BIT_LENGTH {
            return Err(VerifyError::MalformedProof(format!(
                "bit length {} (expected {RANGE_BIT_LENGTH})",
                self.bit_length
            )));
        }
        let n = RANGE_BIT_LENGTH as usize;
        if self.bit_commitments.len() != n || self.responses.len() != n {
            return Err(VerifyError::MalformedProof(format!(
                "expected {n} bit commitments and responses, got {} and {}",
                self.bit_commitments.len(),
                self.responses.len()
            )));
        }
        if self.lower_bound != expected_lower_bound {
            return Err(VerifyError::Mismatch(format!(
                "proof bound {} does not match expected bound {expected_lower_bound}",
                self.lower_bound
            )));
        }
        let expected_challenge = challenge(
            domain,
            &self.commitment,
            self.lower_bound,
            self.bit_length,
            &self.bit_commitments,
        );
        if !ct_eq(&expected_challenge, &self.challenge) {
            return Err(VerifyError::Mismatch("challenge".into()));
        }
        if !ct_eq(&seal(&self.challenge, &self.responses), &self.seal) {
            return Err(VerifyError::Mismatch("seal".into()));
        }
        Ok(())
    }

    /// Bytes bound into enclosing transcripts.
    pub fn commitment_bytes(&self) -> Vec<u8> {
        self.commitment.as_bytes().to_vec()
    }
}
