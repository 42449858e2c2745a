//! # Hash-Commitment Proof Backend
//!
//! The deterministic backend used on chain. Every proof is a pure function
//! of `(domain, secret, nonce, salt)`; two validators given the same inputs
//! emit byte-identical proofs.
//!
//! Serves [`ProofScheme::HashCommitment`] only. Requests for SNARK or BBS+
//! schemes are rejected by the engine before any method here runs.

use std::collections::BTreeSet;

use crate::knowledge::PedersenKnowledgeProof;
use crate::membership::SetMembershipProof;
use crate::range::RangeProof;
use crate::traits::{ProofBackend, ProofError, ProofScheme, VerifyError};

/// Deterministic hash/commitment proof backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashCommitmentBackend;

impl HashCommitmentBackend {
    /// Construct the backend.
    pub fn new() -> Self {
        Self
    }
}

impl ProofBackend for HashCommitmentBackend {
    fn name(&self) -> &'static str {
        "hash-commitment"
    }

    fn supports(&self, scheme: ProofScheme) -> bool {
        scheme == ProofScheme::HashCommitment
    }

    fn prove_range(
        &self,
        domain: &str,
        value: u64,
        lower_bound: u64,
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<RangeProof, ProofError> {
        RangeProof::generate(domain, value, lower_bound, nonce, salt)
    }

    fn verify_range(
        &self,
        domain: &str,
        proof: &RangeProof,
        expected_lower_bound: u64,
    ) -> Result<(), VerifyError> {
        proof.verify(domain, expected_lower_bound)
    }

    fn prove_membership(
        &self,
        domain: &str,
        element: &str,
        set: &BTreeSet<String>,
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<SetMembershipProof, ProofError> {
        SetMembershipProof::generate(domain, element, set, nonce, salt)
    }

    fn verify_membership(
        &self,
        domain: &str,
        proof: &SetMembershipProof,
        expected_set: &BTreeSet<String>,
    ) -> Result<(), VerifyError> {
        proof.verify(domain, expected_set)
    }

    fn prove_knowledge(
        &self,
        domain: &str,
        secret: &[u8],
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<PedersenKnowledgeProof, ProofError> {
        Ok(PedersenKnowledgeProof::generate(domain, secret, nonce, salt))
    }

    fn verify_knowledge(
        &self,
        domain: &str,
        proof: &PedersenKnowledgeProof,
    ) -> Result<(), VerifyError> {
        proof.verify(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> Box<dyn ProofBackend> {
        Box::new(HashCommitmentBackend::new())
    }

    #[test]
    fn serves_only_hash_commitment() {
        let b = backend();
        assert!(b.supports(ProofScheme::HashCommitment));
        assert!(!b.supports(ProofScheme::Groth16));
        assert!(!b.supports(ProofScheme::BbsPlus));
        assert_eq!(b.name(), "hash-commitment");
    }

    #[test]
    fn range_through_trait_object() {
        let b = backend();
        let p = b.prove_range("veid:d", 40, 25, b"n", b"s").unwrap();
        b.verify_range("veid:d", &p, 25).unwrap();
        assert!(b.verify_range("veid:d", &p, 18).is_err());
    }

    #[test]
    fn membership_through_trait_object() {
        let b = backend();
        let set: BTreeSet<String> = ["DE".to_string()].into_iter().collect();
        let p = b.prove_membership("veid:d", "DE", &set, b"n", b"s").unwrap();
        b.verify_membership("veid:d", &p, &set).unwrap();
    }

    #[test]
    fn knowledge_through_trait_object() {
        let b = backend();
        let p = b.prove_knowledge("veid:d", b"email_verified", b"n", b"s").unwrap();
        b.verify_knowledge("veid:d", &p).unwrap();
        assert!(b.verify_knowledge("veid:e", &p).is_err());
    }

    #[test]
    fn proofs_survive_json() {
        let b = backend();
        let p = b.prove_range("veid:d", 40, 25, b"n", b"s").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: RangeProof = serde_json::from_str(&json).unwrap();
        b.verify_range("veid:d", &back, 25).unwrap();
    }
}
