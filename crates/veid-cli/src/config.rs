//! # Configuration
//!
//! `VeidConfig` groups the engine settings. It is read from the file named
//! by `--config`, else by `VEID_CONFIG`, else defaults apply. Missing
//! sections and fields take their defaults.
//!
//! ```yaml
//! scoring:
//!   pass_threshold: 60
//!   weights:
//!     document_authenticity: 3000
//!     face_match: 2000
//! disclosure:
//!   default_request_expiry_secs: 3600
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use veid_disclosure::{DisclosureConfig, DisclosureEngine};
use veid_scoring::{ScoringConfig, ScoringEngine};

use crate::read_document;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "VEID_CONFIG";

/// Settings for every engine the CLI builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VeidConfig {
    pub scoring: ScoringConfig,
    pub disclosure: DisclosureConfig,
}

impl VeidConfig {
    /// Load from `path`, else `$VEID_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(from_env) {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading configuration");
                read_document(&p)
            }
            None => Ok(Self::default()),
        }
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate().context("invalid scoring configuration")?;
        self.disclosure
            .validate()
            .context("invalid disclosure configuration")?;
        Ok(())
    }

    pub fn scoring_engine(&self) -> Result<ScoringEngine> {
        ScoringEngine::new(self.scoring.clone()).context("invalid scoring configuration")
    }

    pub fn disclosure_engine(&self) -> Result<DisclosureEngine> {
        DisclosureEngine::with_config(self.disclosure.clone())
            .context("invalid disclosure configuration")
    }
}

/// `veid config` arguments.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate a configuration file (default: the active configuration).
    Check {
        /// File to check instead of `--config` / `$VEID_CONFIG`.
        path: Option<PathBuf>,
    },
}

/// Execute `veid config`.
pub fn run_config(args: &ConfigArgs, global: Option<&Path>) -> Result<u8> {
    match &args.command {
        ConfigCommand::Check { path } => {
            let cfg = VeidConfig::load(path.as_deref().or(global))?;
            cfg.validate()?;
            println!("configuration OK");
            Ok(0)
        }
    }
}
