//! # Set-Membership Proofs
//!
//! Proves that a committed element belongs to a public set. The set is
//! identified by a digest over its sorted members, so two verifiers holding
//! the same set in different insertion orders agree on it. One blinded slot
//! commitment is emitted per set member; the slot matching the secret
//! element carries a membership flag that the transcript binds without
//! revealing which slot it is.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use veid_core::{Digest32, Sha256Accumulator};
use veid_crypto::{commit, ct_eq};

use crate::traits::{ProofError, VerifyError};

/// Largest set a membership proof may cover.
pub const MAX_SET_SIZE: usize = 256;

const SET_DOMAIN: &str = "veid:membership:set";
const BLIND_DOMAIN: &str = "veid:membership:blind";
const SLOT_DOMAIN: &str = "veid:membership:slot";
const CHALLENGE_DOMAIN: &str = "veid:membership:challenge";
const RESPONSE_DOMAIN: &str = "veid:membership:response";
const SEAL_DOMAIN: &str = "veid:membership:seal";

/// A proof that a committed element is a member of a public set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMembershipProof {
    /// `commit(domain, element, salt)`.
    pub commitment: Digest32,
    /// Digest of the sorted public set.
    pub set_digest: Digest32,
    /// Number of members in the set.
    pub set_size: u32,
    /// One blinded commitment per set member, in sorted order.
    pub slot_commitments: Vec<Digest32>,
    /// Fiat–Shamir challenge.
    pub challenge: Digest32,
    /// One response per slot.
    pub responses: Vec<Digest32>,
    /// Binds challenge and responses.
    pub seal: Digest32,
}

/// Digest of a set, independent of insertion order.
pub fn set_digest(set: &BTreeSet<String>) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(SET_DOMAIN);
    acc.field_u64(set.len() as u64);
    for member in set {
        acc.field(member.as_bytes());
    }
    acc.finalize()
}

fn blind(salt: &[u8], nonce: &[u8], slot: u32) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(BLIND_DOMAIN);
    acc.field(salt).field(nonce).field_u64(u64::from(slot));
    acc.finalize()
}

fn slot_commitment(domain: &str, slot: u32, flag: u8, blind: &Digest32) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(SLOT_DOMAIN);
    acc.field(domain.as_bytes())
        .field_u64(u64::from(slot))
        .field(&[flag])
        .field(blind.as_bytes());
    acc.finalize()
}

fn challenge(
    domain: &str,
    commitment: &Digest32,
    set_digest: &Digest32,
    set_size: u32,
    slots: &[Digest32],
) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(CHALLENGE_DOMAIN);
    acc.field(domain.as_bytes())
        .field(commitment.as_bytes())
        .field(set_digest.as_bytes())
        .field_u64(u64::from(set_size));
    for s in slots {
        acc.field(s.as_bytes());
    }
    acc.finalize()
}

fn response(challenge: &Digest32, slot: u32, blind: &Digest32, flag: u8) -> Digest32 {
    let mut acc = Sha256Accumulator::with_domain(RESPONSE_DOMAIN);
    acc.field(challenge.as_bytes())
        .field_u64(u64::from(slot))
        .field(blind.as_bytes())
        .field(&[flag]);
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

impl SetMembershipProof {
    /// Generate a proof that `element ∈ set`.
    pub fn generate(
        domain: &str,
        element: &str,
        set: &BTreeSet<String>,
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<Self, ProofError> {
        if set.is_empty() {
            return Err(ProofError::OutOfRange("membership set is empty".into()));
        }
        if set.len() > MAX_SET_SIZE {
            return Err(ProofError::OutOfRange(format!(
                "membership set has {} members (max {MAX_SET_SIZE})",
                set.len()
            )));
        }
        if !set.contains(element) {
            return Err(ProofError::StatementFalse(
                "element is not a member of the set".into(),
            ));
        }

        let commitment = commit(domain, element.as_bytes(), salt);
        let digest = set_digest(set);
        let set_size = set.len() as u32;

        let mut blinds = Vec::with_capacity(set.len());
        let mut flags = Vec::with_capacity(set.len());
        let mut slots = Vec::with_capacity(set.len());
        for (i, member) in set.iter().enumerate() {
            let slot = i as u32;
            let flag = u8::from(member == element);
            let b = blind(salt, nonce, slot);
            slots.push(slot_commitment(domain, slot, flag, &b));
            blinds.push(b);
            flags.push(flag);
        }

        let challenge = challenge(domain, &commitment, &digest, set_size, &slots);
        let responses: Vec<Digest32> = blinds
            .iter()
            .zip(&flags)
            .enumerate()
            .map(|(i, (b, flag))| response(&challenge, i as u32, b, *flag))
            .collect();
        let seal = seal(&challenge, &responses);

        Ok(Self {
            commitment,
            set_digest: digest,
            set_size,
            slot_commitments: slots,
            challenge,
            responses,
            seal,
        })
    }

    /// Check the proof against the set the verifier expects.
    pub fn verify(&self, domain: &str, expected_set: &BTreeSet<String>) -> Result<(), VerifyError> {
        let n = self.set_size as usize;
        if n == 0 || n > MAX_SET_SIZE {
            return Err(VerifyError::MalformedProof(format!("set size {n}")));
        }
        if self.slot_commitments.len() != n || self.responses.len() != n {
            return Err(VerifyError::MalformedProof(format!(
                "expected {n} slots and responses, got {} and {}",
                self.slot_commitments.len(),
                self.responses.len()
            )));
        }
        if n != expected_set.len() || !ct_eq(&self.set_digest, &set_digest(expected_set)) {
            return Err(VerifyError::Mismatch("set digest".into()));
        }
        let expected_challenge = challenge(
            domain,
            &self.commitment,
            &self.set_digest,
            self.set_size,
            &self.slot_commitments,
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
