//! # Proof Backend Trait
//!
//! [`ProofBackend`] is the single seam between the disclosure engine and a
//! concrete proof construction. The deterministic hash backend and any future
//! SNARK backend are two implementations of it; the engine is handed one at
//! construction and never branches on which one it holds.
//!
//! ## Security Invariant
//!
//! Implementations must be pure: identical arguments yield identical proofs
//! on every validator. No entropy source may be consulted. Nonces and salts
//! arrive already resolved by the Deterministic Randomness Resolver.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::knowledge::PedersenKnowledgeProof;
use crate::membership::SetMembershipProof;
use crate::range::RangeProof;

/// Error during proof generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// The secret does not satisfy the statement. Generation refuses
    /// instead of emitting a false proof.
    #[error("statement does not hold: {0}")]
    StatementFalse(String),

    /// Inputs fall outside what the construction can express.
    #[error("input out of range: {0}")]
    OutOfRange(String),

    /// The backend does not implement the requested scheme.
    #[error("unsupported proof scheme: {0}")]
    UnsupportedScheme(ProofScheme),
}

/// Error during proof verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof is structurally malformed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The proof does not match the public statement.
    #[error("proof mismatch: {0}")]
    Mismatch(String),

    /// The backend does not implement the requested scheme.
    #[error("unsupported proof scheme: {0}")]
    UnsupportedScheme(ProofScheme),
}

/// Proof scheme named on a selective-disclosure proof.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProofScheme {
    /// Deterministic hash/commitment transcripts.
    #[default]
    HashCommitment,
    /// Groth16 SNARK over BN254.
    Groth16,
    /// BBS+ signature-based selective disclosure.
    BbsPlus,
}

impl ProofScheme {
    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HashCommitment => "hash_commitment",
            Self::Groth16 => "groth16",
            Self::BbsPlus => "bbs_plus",
        }
    }
}

impl fmt::Display for ProofScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash_commitment" => Ok(Self::HashCommitment),
            "groth16" => Ok(Self::Groth16),
            "bbs_plus" => Ok(Self::BbsPlus),
            other => Err(format!("unknown proof scheme {other:?}")),
        }
    }
}

/// Kind of per-claim proof inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    /// Secret value is at least a public lower bound.
    Range,
    /// Secret element belongs to a public set.
    SetMembership,
    /// Knowledge of a Pedersen commitment opening.
    PedersenKnowledge,
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Range => "range",
            Self::SetMembership => "set_membership",
            Self::PedersenKnowledge => "pedersen_knowledge",
        })
    }
}

/// Strategy interface for proof construction and checking.
///
/// Every method takes a `domain` label that is bound into the transcript; a
/// proof generated under one label never verifies under another.
pub trait ProofBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &'static str;

    /// Whether this backend serves `scheme`.
    fn supports(&self, scheme: ProofScheme) -> bool;

    /// Prove `value >= lower_bound` within the backend's bit length.
    fn prove_range(
        &self,
        domain: &str,
        value: u64,
        lower_bound: u64,
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<RangeProof, ProofError>;

    /// Check a range proof against the bound the verifier expects.
    fn verify_range(
        &self,
        domain: &str,
        proof: &RangeProof,
        expected_lower_bound: u64,
    ) -> Result<(), VerifyError>;

    /// Prove `element ∈ set`.
    fn prove_membership(
        &self,
        domain: &str,
        element: &str,
        set: &BTreeSet<String>,
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<SetMembershipProof, ProofError>;

    /// Check a membership proof against the set the verifier expects.
    fn verify_membership(
        &self,
        domain: &str,
        proof: &SetMembershipProof,
        expected_set: &BTreeSet<String>,
    ) -> Result<(), VerifyError>;

    /// Commit to `secret` and prove knowledge of the opening.
    fn prove_knowledge(
        &self,
        domain: &str,
        secret: &[u8],
        nonce: &[u8],
        salt: &[u8],
    ) -> Result<PedersenKnowledgeProof, ProofError>;

    /// Check a knowledge proof against its own commitment.
    fn verify_knowledge(
        &self,
        domain: &str,
        proof: &PedersenKnowledgeProof,
    ) -> Result<(), VerifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_string_roundtrip() {
        for scheme in [ProofScheme::HashCommitment, ProofScheme::Groth16, ProofScheme::BbsPlus] {
            assert_eq!(scheme.as_str().parse::<ProofScheme>().unwrap(), scheme);
            let json = serde_json::to_string(&scheme).unwrap();
            assert_eq!(json, format!("\"{}\"", scheme.as_str()));
        }
        assert!("plonk".parse::<ProofScheme>().is_err());
    }

    #[test]
    fn proof_kind_display_matches_serde() {
        for kind in [ProofKind::Range, ProofKind::SetMembership, ProofKind::PedersenKnowledge] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn error_messages_name_the_scheme() {
        let err = ProofError::UnsupportedScheme(ProofScheme::Groth16);
        assert!(err.to_string().contains("groth16"));
        let err = VerifyError::UnsupportedScheme(ProofScheme::BbsPlus);
        assert!(err.to_string().contains("bbs_plus"));
    }
}
