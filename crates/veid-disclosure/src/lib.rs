//! # veid-disclosure: Selective Disclosure for the VEID Identity Layer
//!
//! Lets an identity holder prove narrow statements about themselves (age
//! over a tier, residency in an allowed set, composite score over a
//! threshold, a verified channel) without revealing the underlying values.
//!
//! ## Flow
//!
//! ```text
//! RequestDraft ──create_request──▶ SelectiveDisclosureRequest
//!                                        │
//!         IdentityLookup + ScoreLookup ──┤ generate_proof
//!                                        ▼
//!                              SelectiveDisclosureProof ──verify_proof──▶ ProofVerificationResult
//!                                                          ▲
//!                                       RevocationRegistry ┘
//! ```
//!
//! Every step is consensus-deterministic: time and randomness come from the
//! [`BlockContext`](veid_core::BlockContext), and proofs are built by the
//! [`ProofBackend`](veid_zkp::ProofBackend) the [`DisclosureEngine`] was
//! constructed with.
//!
//! [`DisclosureKeeper`] binds the engine to a host key-value store and an
//! event sink.

pub mod availability;
pub mod claims;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod identity;
pub mod keeper;
pub mod lookup;
pub mod proof;
pub mod request;
pub mod specialized;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use availability::validate_claim_availability;
pub use claims::{ClaimParameters, ClaimType, ResidencyParams, ScoreThresholdParams, VerificationLevel};
pub use config::{ConfigError, DisclosureConfig, BUNDLE_VERSION};
pub use engine::DisclosureEngine;
pub use error::{DisclosureError, KeeperError};
pub use generator::{proof_id, ProofOptions};
pub use identity::{IdentityRecord, IdentityStatus, IdentityTier};
pub use keeper::{DisclosureKeeper, Event, EventSink, MemoryEventSink, StoreLookups};
pub use lookup::{IdentityLookup, NoRevocations, RevocationRegistry, ScoreLookup};
pub use proof::{
    ClaimProof, ClaimProofEntry, ProofMetadata, SelectiveDisclosureProof,
    SelectiveDisclosureProofBundle,
};
pub use request::{request_id, RequestDraft, SelectiveDisclosureRequest};
pub use specialized::{AgeProof, ResidencyProof, ScoreThresholdProof, TypedProof};
pub use verifier::{verified_claim_set, ProofVerificationResult};
