//! # Selective Disclosure Request Manager
//!
//! A request names who wants to know what, why, and for how long. It is
//! validated in full before construction; an invalid request is never
//! partially built.
//!
//! `request_id = H("veid:sdr:request_id" || requester || subject || nonce)`,
//! with the nonce resolved under `veid:sdr:nonce` from the requester,
//! subject, purpose, canonical claims and parameters and the validity
//! window when the caller supplies none. Two requests that differ in any of
//! these get distinct ids within one block.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use veid_core::encoding::hex_bytes;
use veid_core::{domain_hash, AccountAddress, BlockContext, CanonicalBytes, Digest32, Timestamp};
use veid_crypto::randomness::domains;
use veid_crypto::{RandomnessInputs, RandomnessResolver};

use crate::claims::{ClaimParameters, ClaimType};
use crate::engine::DisclosureEngine;
use crate::error::DisclosureError;

const REQUEST_ID_DOMAIN: &str = "veid:sdr:request_id";

/// Longest accepted purpose string, in bytes.
pub const MAX_PURPOSE_LEN: usize = 256;

/// Caller-supplied fields of a new request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDraft {
    pub requester: AccountAddress,
    pub subject: AccountAddress,
    pub claims: BTreeSet<ClaimType>,
    #[serde(default)]
    pub params: ClaimParameters,
    pub purpose: String,
    /// Validity window of the resulting proof.
    pub validity_secs: i64,
    /// Request lifetime. Non-positive means the configured default.
    #[serde(default)]
    pub request_expiry_secs: i64,
}

/// A validated selective-disclosure request. Read-only once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectiveDisclosureRequest {
    pub request_id: Digest32,
    pub requester: AccountAddress,
    pub subject: AccountAddress,
    pub requested_claims: BTreeSet<ClaimType>,
    #[serde(default)]
    pub claim_parameters: ClaimParameters,
    pub purpose: String,
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
    pub validity_duration_secs: i64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl SelectiveDisclosureRequest {
    /// Whether the request has expired at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Re-check the invariants of a request read from outside.
    pub fn validate(&self) -> Result<(), DisclosureError> {
        validate_shape(
            &self.requested_claims,
            &self.claim_parameters,
            &self.purpose,
            self.validity_duration_secs,
        )?;
        let expected = request_id(&self.requester, &self.subject, &self.nonce);
        if expected != self.request_id {
            return Err(DisclosureError::InvalidProofRequest(
                "request id does not match requester, subject and nonce".into(),
            ));
        }
        if self.expires_at <= self.created_at {
            return Err(DisclosureError::InvalidProofRequest(
                "request expires before it is created".into(),
            ));
        }
        Ok(())
    }
}

/// `H("veid:sdr:request_id" || requester || subject || nonce)`.
pub fn request_id(requester: &AccountAddress, subject: &AccountAddress, nonce: &[u8]) -> Digest32 {
    domain_hash(
        REQUEST_ID_DOMAIN,
        &[requester.as_bytes(), subject.as_bytes(), nonce],
    )
}

fn validate_shape(
    claims: &BTreeSet<ClaimType>,
    params: &ClaimParameters,
    purpose: &str,
    validity_secs: i64,
) -> Result<(), DisclosureError> {
    if claims.is_empty() {
        return Err(DisclosureError::InvalidProofRequest(
            "at least one claim is required".into(),
        ));
    }
    params.validate_for(claims)?;
    if purpose.trim().is_empty() {
        return Err(DisclosureError::InvalidProofRequest("purpose is required".into()));
    }
    if purpose.len() > MAX_PURPOSE_LEN {
        return Err(DisclosureError::InvalidProofRequest(format!(
            "purpose exceeds {MAX_PURPOSE_LEN} bytes"
        )));
    }
    if validity_secs <= 0 {
        return Err(DisclosureError::InvalidProofRequest(
            "validity duration must be positive".into(),
        ));
    }
    Ok(())
}

impl DisclosureEngine {
    /// Validate `draft` and build a request at the current block.
    pub fn create_request(
        &self,
        ctx: &BlockContext,
        draft: RequestDraft,
        randomness: &RandomnessInputs,
    ) -> Result<SelectiveDisclosureRequest, DisclosureError> {
        validate_shape(&draft.claims, &draft.params, &draft.purpose, draft.validity_secs)?;
        if draft.validity_secs > self.config().max_validity_secs {
            return Err(DisclosureError::InvalidProofRequest(format!(
                "validity duration exceeds {} seconds",
                self.config().max_validity_secs
            )));
        }

        let expiry_secs = if draft.request_expiry_secs <= 0 {
            self.config().default_request_expiry_secs
        } else {
            draft.request_expiry_secs
        };
        let expires_at = Duration::try_seconds(expiry_secs)
            .and_then(|d| ctx.time.checked_add(d))
            .ok_or_else(|| {
                DisclosureError::InvalidProofRequest("request expiry out of range".into())
            })?;

        let claims = CanonicalBytes::new(&draft.claims)
            .map_err(|e| DisclosureError::InvalidProofRequest(e.to_string()))?;
        let params = CanonicalBytes::new(&draft.params)
            .map_err(|e| DisclosureError::InvalidProofRequest(e.to_string()))?;
        let validity = draft.validity_secs.to_be_bytes();
        let context: [&[u8]; 6] = [
            draft.requester.as_bytes(),
            draft.subject.as_bytes(),
            draft.purpose.as_bytes(),
            claims.as_bytes(),
            params.as_bytes(),
            &validity,
        ];
        let nonce = RandomnessResolver::for_block(ctx).resolve(
            randomness.nonce.as_deref(),
            domains::SDR_NONCE,
            &context,
        );
        let request_id = request_id(&draft.requester, &draft.subject, &nonce);

        tracing::debug!(
            %request_id,
            requester = %draft.requester,
            subject = %draft.subject,
            claims = draft.claims.len(),
            "selective disclosure request created"
        );

        Ok(SelectiveDisclosureRequest {
            request_id,
            requester: draft.requester,
            subject: draft.subject,
            requested_claims: draft.claims,
            claim_parameters: draft.params,
            purpose: draft.purpose,
            nonce,
            validity_duration_secs: draft.validity_secs,
            created_at: ctx.time,
            expires_at,
        })
    }
}
