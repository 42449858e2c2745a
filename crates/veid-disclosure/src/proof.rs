//! # Proof Objects
//!
//! A [`SelectiveDisclosureProof`] carries a serialized
//! [`SelectiveDisclosureProofBundle`] in `proof_value`: one
//! [`ClaimProofEntry`] per requested claim, in claim order, plus a binding
//! digest that ties the entries to the proof header.
//!
//! ```text
//! binding = H("veid:sdr:bundle" || version || proof_id || subject || scheme
//!             || commitment_hash || claim_parameters || valid_until
//!             || canonical(entries))
//! ```
//!
//! `proof_value` holds the JCS bytes of the bundle. Verification requires
//! the stored bytes to equal the canonical re-encoding of what they parse
//! to, so no alternative spelling of a bundle verifies.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use veid_core::encoding::hex_bytes;
use veid_core::{
    AccountAddress, CanonicalBytes, CanonicalizationError, Digest32, Sha256Accumulator, Timestamp,
};
use veid_zkp::{PedersenKnowledgeProof, ProofKind, ProofScheme, RangeProof, SetMembershipProof};

use crate::claims::ClaimType;

const BINDING_DOMAIN: &str = "veid:sdr:bundle";

/// Proof payload of one claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimProof {
    Range(RangeProof),
    SetMembership(SetMembershipProof),
    PedersenKnowledge(PedersenKnowledgeProof),
}

impl ClaimProof {
    /// The kind of this payload.
    pub fn kind(&self) -> ProofKind {
        match self {
            Self::Range(_) => ProofKind::Range,
            Self::SetMembership(_) => ProofKind::SetMembership,
            Self::PedersenKnowledge(_) => ProofKind::PedersenKnowledge,
        }
    }

    /// Commitment bytes of this payload.
    pub fn commitment_bytes(&self) -> Vec<u8> {
        match self {
            Self::Range(p) => p.commitment_bytes(),
            Self::SetMembership(p) => p.commitment_bytes(),
            Self::PedersenKnowledge(p) => p.commitment_bytes(),
        }
    }
}

/// One claim's entry in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProofEntry {
    pub claim_type: ClaimType,
    pub kind: ProofKind,
    #[serde(with = "hex_bytes")]
    pub commitment: Vec<u8>,
    pub proof: ClaimProof,
}

impl ClaimProofEntry {
    /// Wrap a payload, copying out its kind and commitment.
    pub fn new(claim_type: ClaimType, proof: ClaimProof) -> Self {
        Self {
            claim_type,
            kind: proof.kind(),
            commitment: proof.commitment_bytes(),
            proof,
        }
    }
}

/// Header fields bound into a bundle.
#[derive(Debug, Clone, Copy)]
pub struct BindingContext<'a> {
    pub proof_id: &'a Digest32,
    pub subject: &'a AccountAddress,
    pub scheme: ProofScheme,
    pub commitment_hash: &'a Digest32,
    pub claim_parameters: &'a str,
    pub valid_until: Timestamp,
}

/// Versioned, ordered sequence of claim entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectiveDisclosureProofBundle {
    pub version: u32,
    pub entries: Vec<ClaimProofEntry>,
    pub binding: Digest32,
}

impl SelectiveDisclosureProofBundle {
    /// Assemble a bundle and compute its binding.
    pub fn assemble(
        version: u32,
        entries: Vec<ClaimProofEntry>,
        ctx: BindingContext<'_>,
    ) -> Result<Self, CanonicalizationError> {
        let binding = compute_binding(version, &entries, ctx)?;
        Ok(Self {
            version,
            entries,
            binding,
        })
    }
}

/// Binding digest over the header and the canonical entries.
pub fn compute_binding(
    version: u32,
    entries: &[ClaimProofEntry],
    ctx: BindingContext<'_>,
) -> Result<Digest32, CanonicalizationError> {
    let canonical_entries = CanonicalBytes::new(&entries)?;
    let mut acc = Sha256Accumulator::with_domain(BINDING_DOMAIN);
    acc.field_u64(u64::from(version))
        .field(ctx.proof_id.as_bytes())
        .field(ctx.subject.as_bytes())
        .field(ctx.scheme.as_str().as_bytes())
        .field(ctx.commitment_hash.as_bytes())
        .field(ctx.claim_parameters.as_bytes())
        .field_i64(ctx.valid_until.epoch_secs())
        .field(canonical_entries.as_bytes());
    Ok(acc.finalize())
}

/// Data a verifier needs to reconstruct commitments and public bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofMetadata {
    /// Commitment salt, lowercase hex.
    pub commitment_salt: String,
    /// Effective claim parameters, canonical JSON.
    pub claim_parameters: String,
}

/// A generated selective-disclosure proof. Immutable; may be revoked by id
/// or expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectiveDisclosureProof {
    pub proof_id: Digest32,
    pub request_id: Digest32,
    pub subject: AccountAddress,
    pub requester: AccountAddress,
    pub claim_types: BTreeSet<ClaimType>,
    pub scheme: ProofScheme,
    /// Explicitly revealed subset of the claims.
    #[serde(default)]
    pub disclosed_claims: BTreeMap<ClaimType, serde_json::Value>,
    pub commitment_hash: Digest32,
    /// JCS bytes of the bundle.
    #[serde(with = "hex_bytes")]
    pub proof_value: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
    pub metadata: ProofMetadata,
    pub created_at: Timestamp,
    pub valid_until: Timestamp,
}
