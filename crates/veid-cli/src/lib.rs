//! # veid-cli: Command Line for the VEID Identity Layer
//!
//! Drives the scoring and disclosure engines over files, for operators and
//! for reproducing on-chain results off-chain.
//!
//! ## Subcommands
//!
//! - `veid score`: composite identity score from an inputs file.
//! - `veid config check`: validate a configuration file.
//! - `veid request`: create a selective-disclosure request.
//! - `veid prove`: answer a request from a state snapshot.
//! - `veid verify`: verify a proof; exit code 2 when invalid.
//!
//! ```bash
//! veid request --requester veid1bank --subject veid1alice --claim age_over_18 \
//!     --purpose "account opening" --validity-secs 3600 --height 10 --time 2023-11-14T22:13:20Z
//! ```
//!
//! Every command takes block height and time explicitly: the CLI never
//! reads the wall clock, so its output matches what a validator computes.

pub mod config;
pub mod disclosure;
pub mod score;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use veid_core::{BlockContext, Timestamp};

/// Parse a block time given as RFC 3339 (`Z` suffix) or epoch seconds.
pub fn parse_time(raw: &str) -> Result<Timestamp, String> {
    match raw.parse::<i64>() {
        Ok(secs) => Timestamp::from_epoch_secs(secs).map_err(|e| e.to_string()),
        Err(_) => Timestamp::parse(raw).map_err(|e| e.to_string()),
    }
}

/// Block context from `--height` and `--time`.
pub fn block(height: u64, time: Timestamp) -> BlockContext {
    BlockContext::new(height, time)
}

/// Read a JSON or YAML document. `.yaml` / `.yml` files are YAML, anything
/// else is JSON.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON in {}", path.display()))
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
