//! # veid-core: Foundational Types for the VEID Identity Layer
//!
//! Every other crate in the workspace depends on `veid-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Consensus determinism.** Nothing in this crate reads the wall clock
//!    or an entropy source. Time enters only through [`BlockContext`], which
//!    the host supplies identically to every validator.
//!
//! 2. **`CanonicalBytes` newtype.** Digests over structured data flow through
//!    `CanonicalBytes::new()` (RFC 8785 JCS, floats rejected). Raw
//!    `serde_json::to_vec()` output is never hashed.
//!
//! 3. **Length-prefixed hash framing.** [`Sha256Accumulator::field`] writes
//!    every field as `len_be64 || bytes`, so `H(a || b)` is never ambiguous
//!    across field boundaries.
//!
//! 4. **Validated newtypes.** [`AccountAddress`] and [`CountryCode`] reject
//!    malformed values at construction and at deserialization.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `veid-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod store;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{domain_hash, sha256_digest, Digest32, Sha256Accumulator};
pub use error::{CanonicalizationError, StoreError, ValidationError};
pub use identity::{AccountAddress, CountryCode};
pub use store::{KvStore, MemoryStore};
pub use temporal::{BlockContext, Timestamp};
