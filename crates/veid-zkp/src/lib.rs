//! # veid-zkp: Proof Backends
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): [`ProofBackend`] is the strategy interface the
//!   disclosure engine is constructed with. It is selected once, at engine
//!   construction, and never re-chosen per call.
//!
//! - **Payloads** (`range.rs`, `membership.rs`, `knowledge.rs`): serializable
//!   proof objects for the three proof kinds.
//!
//! - **Hash backend** (`hash_backend.rs`): [`HashCommitmentBackend`], the
//!   deterministic construction used on chain today. It serves only
//!   [`ProofScheme::HashCommitment`].
//!
//! ## Security Notice
//!
//! The range and set-membership constructions are deterministic hash
//! transcripts, not succinct zero-knowledge proofs. They hide the secret
//! only as far as SHA-256 preimage resistance does. For small secret domains
//! (8-bit ranges, a handful of countries) a verifier who also obtains the
//! commitment salt can recover the secret by enumeration. Secrets are
//! limited to such bounded domains on purpose; do not widen them without a
//! real proving backend.
//!
//! ## Crate Policy
//!
//! - Depends on `veid-core` and `veid-crypto` internally.
//! - Generation and verification are pure functions of their arguments.

pub mod hash_backend;
pub mod knowledge;
pub mod membership;
pub mod range;
pub mod traits;

pub use hash_backend::HashCommitmentBackend;
pub use knowledge::PedersenKnowledgeProof;
pub use membership::SetMembershipProof;
pub use range::{RangeProof, RANGE_BIT_LENGTH};
pub use traits::{ProofBackend, ProofError, ProofKind, ProofScheme, VerifyError};
