//! # Node Configuration
//!
//! One struct per subsystem, each with the subsystem's own defaults, and
//! `CC_*` environment overrides applied on top.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cc_01_block_dag::DagConfig;
use cc_02_fork_choice::ForkChoiceConfig;
use cc_03_validation::ValidationConfig;
use cc_04_finality::{FaultTolerance, FinalityConfig};
use thiserror::Error;
use tracing::warn;

use crate::admission::AdmissionConfig;
use crate::genesis::{GenesisConfig, GenesisError};

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub genesis: GenesisConfig,
    pub dag: DagConfig,
    pub fork_choice: ForkChoiceConfig,
    pub validation: ValidationConfig,
    pub finality: FinalityConfig,
    pub admission: AdmissionConfig,
    pub proposer: ProposerConfig,
}

/// Block production settings. Proposing is off without a signing key.
#[derive(Clone)]
pub struct ProposerConfig {
    /// secp256k1 secret key of the local validator.
    pub signing_key: Option<[u8; 32]>,
    /// Interval between proposals.
    pub interval: Duration,
    /// Deploys taken from the pool per block.
    pub max_deploys: usize,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            signing_key: None,
            interval: Duration::from_secs(4),
            max_deploys: 100,
        }
    }
}

impl fmt::Debug for ProposerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProposerConfig")
            .field("signing_key", &self.signing_key.map(|_| "<redacted>"))
            .field("interval", &self.interval)
            .field("max_deploys", &self.max_deploys)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Genesis(#[from] GenesisError),
}

impl NodeConfig {
    /// Defaults overridden by `CC_*` environment variables.
    ///
    /// | Variable | Applies to |
    /// |----------|------------|
    /// | `CC_GENESIS_BONDS` | `<validator-hex>:<stake>,...` |
    /// | `CC_GENESIS_TIMESTAMP_MS` | genesis timestamp |
    /// | `CC_CHAIN_NAME` | genesis chain name |
    /// | `CC_MAX_PARENTS` | fork choice and validation |
    /// | `CC_MAX_TRAVERSAL_DEPTH` | DAG, fork choice and validation walks |
    /// | `CC_MAX_DEPLOYS` | validation |
    /// | `CC_MAX_BLOCK_BYTES` | validation |
    /// | `CC_MAX_CLOCK_DRIFT_MS` | validation |
    /// | `CC_CHECK_FORK_CHOICE` | validation advisory |
    /// | `CC_FINALITY_THRESHOLD` | e.g. `0` or `1/3` |
    /// | `CC_FINALITY_TICK_MS` | finalization loop |
    /// | `CC_ORACLE_TIMEOUT_MS` | finalization loop |
    /// | `CC_KEEP_DEPTH` | pruning depth, unset disables |
    /// | `CC_EXACT_CLIQUE_MAX` | exact clique cutoff |
    /// | `CC_MAX_PENDING_BLOCKS` | admission queue |
    /// | `CC_VALIDATOR_KEY` | 64 hex chars, enables proposing |
    /// | `CC_PROPOSE_INTERVAL_MS` | proposer |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let env = Env(&lookup);

        if let Some(bonds) = lookup("CC_GENESIS_BONDS") {
            config.genesis.bonds = GenesisConfig::parse_bonds(&bonds)?;
        }
        if let Some(timestamp) = env.parse("CC_GENESIS_TIMESTAMP_MS")? {
            config.genesis.timestamp = timestamp;
        }
        if let Some(name) = lookup("CC_CHAIN_NAME") {
            config.genesis.chain_name = name;
        }

        if let Some(max_parents) = env.parse("CC_MAX_PARENTS")? {
            config.fork_choice.max_parents = max_parents;
            config.validation.max_parents = max_parents;
        }
        if let Some(depth) = env.parse("CC_MAX_TRAVERSAL_DEPTH")? {
            config.dag.max_traversal_depth = depth;
            config.fork_choice.max_traversal_depth = depth;
            config.validation.max_traversal_depth = depth;
        }
        if let Some(max_deploys) = env.parse("CC_MAX_DEPLOYS")? {
            config.validation.max_deploys = max_deploys;
        }
        if let Some(bytes) = env.parse("CC_MAX_BLOCK_BYTES")? {
            config.validation.max_block_bytes = bytes;
        }
        if let Some(drift) = env.parse("CC_MAX_CLOCK_DRIFT_MS")? {
            config.validation.max_clock_drift_ms = drift;
        }
        if let Some(check) = env.parse("CC_CHECK_FORK_CHOICE")? {
            config.validation.check_fork_choice = check;
        }

        if let Some(threshold) = env.parse::<FaultTolerance>("CC_FINALITY_THRESHOLD")? {
            config.finality.threshold = threshold;
        }
        if let Some(ms) = env.parse("CC_FINALITY_TICK_MS")? {
            config.finality.tick_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parse("CC_ORACLE_TIMEOUT_MS")? {
            config.finality.oracle_timeout = Duration::from_millis(ms);
        }
        if let Some(depth) = env.parse("CC_KEEP_DEPTH")? {
            config.finality.keep_depth = Some(depth);
        }
        if let Some(cutoff) = env.parse("CC_EXACT_CLIQUE_MAX")? {
            config.finality.exact_clique_max_validators = cutoff;
        }

        if let Some(max_pending) = env.parse("CC_MAX_PENDING_BLOCKS")? {
            config.admission.max_pending = max_pending;
        }

        if let Some(key) = lookup("CC_VALIDATOR_KEY") {
            config.proposer.signing_key = Some(parse_key(&key)?);
        }
        if let Some(ms) = env.parse("CC_PROPOSE_INTERVAL_MS")? {
            config.proposer.interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no subsystem can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fork_choice.max_parents == 0 {
            return Err(invalid("CC_MAX_PARENTS", "0", "at least one parent is required"));
        }
        if self.finality.tick_interval.is_zero() {
            return Err(invalid("CC_FINALITY_TICK_MS", "0", "tick interval must be positive"));
        }
        if self.proposer.signing_key.is_some() && self.proposer.interval.is_zero() {
            return Err(invalid(
                "CC_PROPOSE_INTERVAL_MS",
                "0",
                "propose interval must be positive",
            ));
        }
        self.genesis.validate()?;
        if self.finality.threshold < FaultTolerance::ZERO {
            warn!(
                threshold = %self.finality.threshold,
                "Finality threshold below 0 can finalize conflicting blocks"
            );
        }
        Ok(())
    }
}

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn parse<T>(&self, var: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match (self.0)(var) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| invalid(var, &value, &e.to_string())),
        }
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_key(value: &str) -> Result<[u8; 32], ConfigError> {
    // The key itself never appears in the error.
    let redacted = "<redacted>";
    let bytes = hex::decode(value.trim().trim_start_matches("0x"))
        .map_err(|e| invalid("CC_VALIDATOR_KEY", redacted, &e.to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| invalid("CC_VALIDATOR_KEY", redacted, "expected 32 bytes"))
}
