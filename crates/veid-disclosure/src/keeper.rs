//! # Disclosure Keeper
//!
//! Binds the engines to a host [`KvStore`] and an [`EventSink`]. The keeper
//! implements the collaborator lookups over the store and persists only
//! after the engine call has succeeded, so a refused operation leaves no
//! trace in state. Stored requests and proofs are never overwritten.
//!
//! Store layout:
//!
//! ```text
//! veid/identity/<address>         IdentityRecord
//! veid/score/<address>            IdentityScore
//! veid/sdr/request/<request_id>   SelectiveDisclosureRequest
//! veid/sdr/proof/<proof_id>       SelectiveDisclosureProof
//! veid/sdr/revoked/<proof_id>     revocation height
//! ```

use veid_core::store::{get_json, set_json};
use veid_core::{AccountAddress, BlockContext, Digest32, KvStore};
use veid_crypto::RandomnessInputs;
use veid_scoring::{CompositeScoringInputs, IdentityScore, ScoringEngine};

use crate::engine::DisclosureEngine;
use crate::error::{DisclosureError, KeeperError};
use crate::generator::ProofOptions;
use crate::identity::IdentityRecord;
use crate::lookup::{IdentityLookup, RevocationRegistry, ScoreLookup};
use crate::proof::SelectiveDisclosureProof;
use crate::request::{RequestDraft, SelectiveDisclosureRequest};
use crate::verifier::ProofVerificationResult;

const IDENTITY_PREFIX: &str = "veid/identity/";
const REQUEST_PREFIX: &str = "veid/sdr/request/";
const PROOF_PREFIX: &str = "veid/sdr/proof/";
const REVOKED_PREFIX: &str = "veid/sdr/revoked/";

pub fn identity_key(address: &AccountAddress) -> Vec<u8> {
    format!("{IDENTITY_PREFIX}{address}").into_bytes()
}

pub fn request_key(request_id: &Digest32) -> Vec<u8> {
    format!("{REQUEST_PREFIX}{request_id}").into_bytes()
}

pub fn proof_key(proof_id: &Digest32) -> Vec<u8> {
    format!("{PROOF_PREFIX}{proof_id}").into_bytes()
}

pub fn revoked_key(proof_id: &Digest32) -> Vec<u8> {
    format!("{REVOKED_PREFIX}{proof_id}").into_bytes()
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A state-change notification with ordered key/value attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: &'static str,
    pub attributes: Vec<(&'static str, String)>,
}

impl Event {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
        }
    }

    fn attr(mut self, key: &'static str, value: impl ToString) -> Self {
        self.attributes.push((key, value.to_string()));
        self
    }

    /// Value of the first attribute named `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Receiver of keeper events, supplied by the host's message router.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

/// Sink that keeps every event in order.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    events: Vec<Event>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

// ---------------------------------------------------------------------------
// Lookups over the store
// ---------------------------------------------------------------------------

/// Read-only view implementing the engine's collaborator traits.
///
/// Entries that fail to decode read as absent and are logged.
#[derive(Debug, Clone, Copy)]
pub struct StoreLookups<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: KvStore + ?Sized> StoreLookups<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: KvStore + ?Sized> IdentityLookup for StoreLookups<'_, S> {
    fn get_identity_record(&self, subject: &AccountAddress) -> Option<IdentityRecord> {
        get_json(self.store, &identity_key(subject)).unwrap_or_else(|e| {
            tracing::error!(%subject, error = %e, "undecodable identity record");
            None
        })
    }
}

impl<S: KvStore + ?Sized> ScoreLookup for StoreLookups<'_, S> {
    fn get_identity_score(&self, subject: &AccountAddress) -> Option<IdentityScore> {
        veid_scoring::get_identity_score(self.store, subject).unwrap_or_else(|e| {
            tracing::error!(%subject, error = %e, "undecodable identity score");
            None
        })
    }
}

impl<S: KvStore + ?Sized> RevocationRegistry for StoreLookups<'_, S> {
    fn is_revoked(&self, proof_id: &Digest32) -> bool {
        self.store.has(&revoked_key(proof_id))
    }
}

// ---------------------------------------------------------------------------
// Keeper
// ---------------------------------------------------------------------------

/// Store-backed front end over the scoring and disclosure engines.
#[derive(Debug)]
pub struct DisclosureKeeper<S, E> {
    store: S,
    events: E,
    disclosure: DisclosureEngine,
    scoring: ScoringEngine,
}

impl<S: KvStore, E: EventSink> DisclosureKeeper<S, E> {
    pub fn new(store: S, events: E, disclosure: DisclosureEngine, scoring: ScoringEngine) -> Self {
        Self {
            store,
            events,
            disclosure,
            scoring,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn engine(&self) -> &DisclosureEngine {
        &self.disclosure
    }

    pub fn lookups(&self) -> StoreLookups<'_, S> {
        StoreLookups::new(&self.store)
    }

    pub fn into_parts(self) -> (S, E) {
        (self.store, self.events)
    }

    /// Write an identity record, replacing any previous one.
    pub fn set_identity_record(&mut self, record: &IdentityRecord) -> Result<(), KeeperError> {
        set_json(&mut self.store, &identity_key(&record.address), record)?;
        Ok(())
    }

    /// Compute and persist a composite score.
    pub fn submit_score(
        &mut self,
        inputs: &CompositeScoringInputs,
    ) -> Result<IdentityScore, KeeperError> {
        let score = self.scoring.compute_and_store(&mut self.store, inputs)?;
        self.events.emit(
            Event::new("identity_score_computed")
                .attr("account", &score.account)
                .attr("passed", score.passed)
                .attr("model_version", &score.model_version),
        );
        Ok(score)
    }

    /// Create and persist a request.
    pub fn submit_request(
        &mut self,
        ctx: &BlockContext,
        draft: RequestDraft,
        randomness: &RandomnessInputs,
    ) -> Result<SelectiveDisclosureRequest, KeeperError> {
        let request = self.disclosure.create_request(ctx, draft, randomness)?;
        let key = request_key(&request.request_id);
        if self.store.has(&key) {
            return Err(DisclosureError::InvalidProofRequest(format!(
                "request {} already exists",
                request.request_id
            ))
            .into());
        }
        set_json(&mut self.store, &key, &request)?;
        self.events.emit(
            Event::new("sdr_request_created")
                .attr("request_id", request.request_id)
                .attr("requester", &request.requester)
                .attr("subject", &request.subject)
                .attr("expires_at", request.expires_at.to_iso8601()),
        );
        Ok(request)
    }

    /// Generate and persist a proof answering a stored request.
    pub fn submit_proof(
        &mut self,
        ctx: &BlockContext,
        subject: &AccountAddress,
        request_id: &Digest32,
        options: &ProofOptions,
    ) -> Result<SelectiveDisclosureProof, KeeperError> {
        let request = self.get_request(request_id)?.ok_or_else(|| {
            DisclosureError::InvalidProofRequest(format!("unknown request {request_id}"))
        })?;
        let proof = self.disclosure.generate_proof(
            ctx,
            &StoreLookups::new(&self.store),
            subject,
            &request,
            options,
        )?;
        let key = proof_key(&proof.proof_id);
        if self.store.has(&key) {
            return Err(DisclosureError::ProofGenerationFailed(format!(
                "proof {} already exists",
                proof.proof_id
            ))
            .into());
        }
        set_json(&mut self.store, &key, &proof)?;
        self.events.emit(
            Event::new("sdr_proof_generated")
                .attr("proof_id", proof.proof_id)
                .attr("request_id", proof.request_id)
                .attr("subject", &proof.subject)
                .attr("scheme", proof.scheme)
                .attr("valid_until", proof.valid_until.to_iso8601()),
        );
        Ok(proof)
    }

    /// Verify `proof` against current state and record the outcome.
    pub fn verify(
        &mut self,
        ctx: &BlockContext,
        proof: &SelectiveDisclosureProof,
        verifier: &AccountAddress,
    ) -> ProofVerificationResult {
        let result =
            self.disclosure
                .verify_proof(ctx, &StoreLookups::new(&self.store), proof, verifier);
        self.events.emit(
            Event::new("sdr_proof_verified")
                .attr("proof_id", result.proof_id)
                .attr("verifier", &result.verifier)
                .attr("valid", result.is_valid),
        );
        result
    }

    /// Revoke a stored proof. Only its subject may do so. Revoking twice
    /// is a no-op.
    pub fn revoke_proof(
        &mut self,
        ctx: &BlockContext,
        proof_id: &Digest32,
        caller: &AccountAddress,
    ) -> Result<(), KeeperError> {
        let proof = self
            .get_proof(proof_id)?
            .ok_or_else(|| DisclosureError::InvalidProof(format!("unknown proof {proof_id}")))?;
        if &proof.subject != caller {
            return Err(DisclosureError::Unauthorized(
                "only the proof's subject may revoke it".into(),
            )
            .into());
        }
        let key = revoked_key(proof_id);
        if self.store.has(&key) {
            return Ok(());
        }
        set_json(&mut self.store, &key, &ctx.height)?;
        tracing::debug!(%proof_id, subject = %caller, "proof revoked");
        self.events.emit(
            Event::new("sdr_proof_revoked")
                .attr("proof_id", proof_id)
                .attr("subject", caller)
                .attr("height", ctx.height),
        );
        Ok(())
    }

    pub fn get_identity_record(
        &self,
        address: &AccountAddress,
    ) -> Result<Option<IdentityRecord>, KeeperError> {
        Ok(get_json(&self.store, &identity_key(address))?)
    }

    pub fn get_request(
        &self,
        request_id: &Digest32,
    ) -> Result<Option<SelectiveDisclosureRequest>, KeeperError> {
        Ok(get_json(&self.store, &request_key(request_id))?)
    }

    pub fn get_proof(
        &self,
        proof_id: &Digest32,
    ) -> Result<Option<SelectiveDisclosureProof>, KeeperError> {
        Ok(get_json(&self.store, &proof_key(proof_id))?)
    }
}
