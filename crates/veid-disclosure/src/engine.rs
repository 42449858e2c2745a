//! # Disclosure Engine
//!
//! Holds the proof backend and configuration. The backend is chosen once,
//! here, and every generation and verification path goes through it; no
//! operation inspects which backend it holds.

use std::fmt;
use std::sync::Arc;

use veid_zkp::{HashCommitmentBackend, ProofBackend};

use crate::config::{ConfigError, DisclosureConfig};

/// The selective-disclosure engine.
#[derive(Clone)]
pub struct DisclosureEngine {
    backend: Arc<dyn ProofBackend>,
    config: DisclosureConfig,
}

impl DisclosureEngine {
    /// Build an engine over `backend` with a validated `config`.
    pub fn new(backend: Arc<dyn ProofBackend>, config: DisclosureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Hash-commitment backend with a validated `config`.
    pub fn with_config(config: DisclosureConfig) -> Result<Self, ConfigError> {
        Self::new(Arc::new(HashCommitmentBackend::new()), config)
    }

    /// The configured backend.
    pub fn backend(&self) -> &dyn ProofBackend {
        self.backend.as_ref()
    }

    /// The validated configuration.
    pub fn config(&self) -> &DisclosureConfig {
        &self.config
    }
}

impl Default for DisclosureEngine {
    fn default() -> Self {
        Self {
            backend: Arc::new(HashCommitmentBackend::new()),
            config: DisclosureConfig::default(),
        }
    }
}

impl fmt::Debug for DisclosureEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisclosureEngine")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}
