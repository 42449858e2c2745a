//! # Pedersen Knowledge Proofs
//!
//! Wraps a [`PedersenCommitment`] to a secret together with the Schnorr
//! proof of knowledge of its opening. Used for claims that assert "I hold
//! the attested value" without any public predicate over it.

use serde::{Deserialize, Serialize};
use veid_crypto::{KnowledgeProof, PedersenCommitment, Scalar};

use crate::traits::VerifyError;

const VALUE_DOMAIN: &str = "veid:knowledge:value";
const BLINDING_DOMAIN: &str = "veid:knowledge:blinding";

/// Commitment plus proof of knowledge of its opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedersenKnowledgeProof {
    /// `g^x · h^r`.
    pub commitment: PedersenCommitment,
    /// Schnorr transcript over the commitment.
    pub proof: KnowledgeProof,
}

impl PedersenKnowledgeProof {
    /// Commit to `secret` and prove knowledge of the opening.
    ///
    /// The blinding factor is derived from `salt` and `nonce`; the value
    /// scalar from `secret` alone.
    pub fn generate(domain: &str, secret: &[u8], nonce: &[u8], salt: &[u8]) -> Self {
        let value = Scalar::derive(VALUE_DOMAIN, &[domain.as_bytes(), secret]);
        let blinding = Scalar::derive(BLINDING_DOMAIN, &[domain.as_bytes(), salt, nonce]);
        let commitment = PedersenCommitment::commit(value, blinding);
        let proof = KnowledgeProof::prove(domain, &commitment, value, blinding, nonce);
        Self { commitment, proof }
    }

    /// Check the proof against its own commitment.
    pub fn verify(&self, domain: &str) -> Result<(), VerifyError> {
        if self.proof.verify(domain, &self.commitment) {
            Ok(())
        } else {
            Err(VerifyError::Mismatch("knowledge proof".into()))
        }
    }

    /// Bytes bound into enclosing transcripts.
    pub fn commitment_bytes(&self) -> Vec<u8> {
        self.commitment.to_bytes().to_vec()
    }
}
