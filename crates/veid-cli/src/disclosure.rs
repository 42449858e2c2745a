//! # Disclosure CLI
//!
//! Request, prove and verify over files. A state snapshot stands in for
//! the chain's identity and score stores:
//!
//! ```yaml
//! identities:
//!   - address: veid1alice
//!     tier: standard
//!     status: active
//!     created_at: "2023-11-14T22:13:20Z"
//!     residency_country: DE
//! scores: []
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use veid_core::{AccountAddress, Digest32, Timestamp};
use veid_crypto::RandomnessInputs;
use veid_disclosure::{
    ClaimParameters, ClaimType, IdentityLookup, IdentityRecord, ProofOptions,
    ProofVerificationResult, RequestDraft, ScoreLookup, SelectiveDisclosureProof,
    SelectiveDisclosureRequest,
};
use veid_scoring::IdentityScore;
use veid_zkp::ProofScheme;

use crate::config::VeidConfig;
use crate::{block, parse_time, print_json, read_document};

/// Exit code of `veid verify` for a proof that does not verify.
pub const EXIT_INVALID_PROOF: u8 = 2;

/// Identity and score snapshot read by `veid prove`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSnapshot {
    pub identities: Vec<IdentityRecord>,
    pub scores: Vec<IdentityScore>,
}

/// Snapshot indexed by address.
#[derive(Debug, Default)]
pub struct SnapshotLookups {
    identities: BTreeMap<AccountAddress, IdentityRecord>,
    scores: BTreeMap<AccountAddress, IdentityScore>,
}

impl From<StateSnapshot> for SnapshotLookups {
    fn from(s: StateSnapshot) -> Self {
        Self {
            identities: s
                .identities
                .into_iter()
                .map(|r| (r.address.clone(), r))
                .collect(),
            scores: s.scores.into_iter().map(|r| (r.account.clone(), r)).collect(),
        }
    }
}

impl IdentityLookup for SnapshotLookups {
    fn get_identity_record(&self, subject: &AccountAddress) -> Option<IdentityRecord> {
        self.identities.get_identity_record(subject)
    }
}

impl ScoreLookup for SnapshotLookups {
    fn get_identity_score(&self, subject: &AccountAddress) -> Option<IdentityScore> {
        self.scores.get_identity_score(subject)
    }
}

fn parse_digest(raw: &str) -> Result<Digest32, String> {
    Digest32::from_hex(raw).map_err(|e| e.to_string())
}

/// Block position shared by every disclosure command.
#[derive(Args, Debug, Clone)]
pub struct BlockArgs {
    /// Block height; seeds derived randomness.
    #[arg(long)]
    pub height: u64,

    /// Block time, RFC 3339 with `Z` or epoch seconds.
    #[arg(long, value_parser = parse_time)]
    pub time: Timestamp,
}

/// `veid request` arguments.
#[derive(Args, Debug)]
pub struct RequestArgs {
    #[arg(long)]
    pub requester: AccountAddress,

    #[arg(long)]
    pub subject: AccountAddress,

    /// Claim to request; repeatable.
    #[arg(long = "claim", required = true)]
    pub claims: Vec<ClaimType>,

    /// Claim parameters file (JSON or YAML).
    #[arg(long)]
    pub params: Option<PathBuf>,

    #[arg(long)]
    pub purpose: String,

    /// Validity window of the resulting proof, in seconds.
    #[arg(long)]
    pub validity_secs: i64,

    /// Request lifetime in seconds; the configured default when omitted.
    #[arg(long, default_value_t = 0)]
    pub expiry_secs: i64,

    #[command(flatten)]
    pub block: BlockArgs,
}

/// `veid prove` arguments.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Identity and score snapshot.
    #[arg(long)]
    pub state: PathBuf,

    /// Request to answer.
    #[arg(long)]
    pub request: PathBuf,

    /// Claims to reveal in the clear, as a map of claim to value.
    #[arg(long)]
    pub disclose: Option<PathBuf>,

    #[arg(long, default_value = "hash_commitment")]
    pub scheme: ProofScheme,

    #[command(flatten)]
    pub block: BlockArgs,
}

/// `veid verify` arguments.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[arg(long)]
    pub proof: PathBuf,

    #[arg(long)]
    pub verifier: AccountAddress,

    /// Revoked proof id; repeatable.
    #[arg(long = "revoked", value_parser = parse_digest)]
    pub revoked: Vec<Digest32>,

    /// Check against these claim parameters instead of the proof's own.
    #[arg(long)]
    pub params: Option<PathBuf>,

    #[command(flatten)]
    pub block: BlockArgs,
}

/// Build a request from command-line arguments.
pub fn create_request(args: &RequestArgs, config: &VeidConfig) -> Result<SelectiveDisclosureRequest> {
    let params: ClaimParameters = match &args.params {
        Some(p) => read_document(p)?,
        None => ClaimParameters::default(),
    };
    let draft = RequestDraft {
        requester: args.requester.clone(),
        subject: args.subject.clone(),
        claims: args.claims.iter().copied().collect(),
        params,
        purpose: args.purpose.clone(),
        validity_secs: args.validity_secs,
        request_expiry_secs: args.expiry_secs,
    };
    let engine = config.disclosure_engine()?;
    let ctx = block(args.block.height, args.block.time);
    engine
        .create_request(&ctx, draft, &RandomnessInputs::derived())
        .context("request rejected")
}

/// Answer a request file from a state snapshot.
pub fn generate_proof(args: &ProveArgs, config: &VeidConfig) -> Result<SelectiveDisclosureProof> {
    let snapshot: StateSnapshot = read_document(&args.state)?;
    let state = SnapshotLookups::from(snapshot);
    let request: SelectiveDisclosureRequest = read_document(&args.request)?;
    let disclosed_claims: BTreeMap<ClaimType, serde_json::Value> = match &args.disclose {
        Some(p) => read_document(p)?,
        None => BTreeMap::new(),
    };
    let options = ProofOptions {
        scheme: args.scheme,
        disclosed_claims,
        randomness: RandomnessInputs::derived(),
    };
    let engine = config.disclosure_engine()?;
    let ctx = block(args.block.height, args.block.time);
    engine
        .generate_proof(&ctx, &state, &request.subject, &request, &options)
        .context("proof generation refused")
}

/// Verify a proof file.
pub fn verify_proof(args: &VerifyArgs, config: &VeidConfig) -> Result<ProofVerificationResult> {
    let proof: SelectiveDisclosureProof = read_document(&args.proof)?;
    let revoked: BTreeSet<Digest32> = args.revoked.iter().copied().collect();
    let engine = config.disclosure_engine()?;
    let ctx = block(args.block.height, args.block.time);
    Ok(match &args.params {
        Some(p) => {
            let expected: ClaimParameters = read_document(p)?;
            engine.verify_proof_with_params(&ctx, &revoked, &proof, &args.verifier, &expected)
        }
        None => engine.verify_proof(&ctx, &revoked, &proof, &args.verifier),
    })
}

/// Execute `veid request`.
pub fn run_request(args: &RequestArgs, config: &VeidConfig) -> Result<u8> {
    let request = create_request(args, config)?;
    print_json(&request)?;
    Ok(0)
}

/// Execute `veid prove`.
pub fn run_prove(args: &ProveArgs, config: &VeidConfig) -> Result<u8> {
    let proof = generate_proof(args, config)?;
    print_json(&proof)?;
    Ok(0)
}

/// Execute `veid verify`.
pub fn run_verify(args: &VerifyArgs, config: &VeidConfig) -> Result<u8> {
    let result = verify_proof(args, config)?;
    print_json(&result)?;
    Ok(if result.is_valid { 0 } else { EXIT_INVALID_PROOF })
}
