//! Engine configuration
//!
//! Defaults cover every field, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! workers = 8
//! default_protocol = "synthesis:4"
//!
//! [scoring]
//! discard_threshold = 0.2
//!
//! [evolution]
//! min_sample = 25
//! ```
//!
//! Environment variables (`CONSENSUS_*`) override the file; see
//! [`EngineConfig::apply_env`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fitness::EvolutionPolicy;
use crate::resolver::{ConsensusProtocol, ResolverConfig};
use crate::scoring::ScoringWeights;
use crate::session::SessionLimits;

/// Error type for configuration loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid config: {field} = {value} ({reason})")]
    OutOfRange {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on concurrent scoring chunks
    pub workers: usize,
    pub default_protocol: ConsensusProtocol,
    pub scoring: ScoringWeights,
    pub resolver: ResolverConfig,
    pub evolution: EvolutionPolicy,
    pub session: SessionLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            default_protocol: ConsensusProtocol::default(),
            scoring: ScoringWeights::default(),
            resolver: ResolverConfig::default(),
            evolution: EvolutionPolicy::default(),
            session: SessionLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, then apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let mut config = Self::from_toml_file(path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without env overrides or validation
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CONSENSUS_*` environment overrides.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `CONSENSUS_WORKERS` | `workers` |
    /// | `CONSENSUS_PROTOCOL` | `default_protocol` |
    /// | `CONSENSUS_DISCARD_THRESHOLD` | `scoring.discard_threshold` |
    /// | `CONSENSUS_SYNTHESIS_FLOOR` | `resolver.synthesis_floor` |
    /// | `CONSENSUS_UNANIMOUS_THRESHOLD` | `resolver.unanimous_threshold` |
    /// | `CONSENSUS_MIN_SAMPLE` | `evolution.min_sample` |
    /// | `CONSENSUS_PRUNE_FLOOR` | `evolution.prune_floor` |
    /// | `CONSENSUS_QUERY_CAPACITY` | `session.query_capacity` |
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        override_with(&lookup, "CONSENSUS_WORKERS", &mut self.workers)?;
        override_with(&lookup, "CONSENSUS_PROTOCOL", &mut self.default_protocol)?;
        override_with(
            &lookup,
            "CONSENSUS_DISCARD_THRESHOLD",
            &mut self.scoring.discard_threshold,
        )?;
        override_with(
            &lookup,
            "CONSENSUS_SYNTHESIS_FLOOR",
            &mut self.resolver.synthesis_floor,
        )?;
        override_with(
            &lookup,
            "CONSENSUS_UNANIMOUS_THRESHOLD",
            &mut self.resolver.unanimous_threshold,
        )?;
        override_with(&lookup, "CONSENSUS_MIN_SAMPLE", &mut self.evolution.min_sample)?;
        override_with(&lookup, "CONSENSUS_PRUNE_FLOOR", &mut self.evolution.prune_floor)?;
        override_with(
            &lookup,
            "CONSENSUS_QUERY_CAPACITY",
            &mut self.session.query_capacity,
        )?;
        Ok(())
    }

    /// Reject weights and thresholds the engine cannot honor
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in self.scoring.weights() {
            if !value.is_finite() || value < 0.0 {
                return Err(out_of_range(field, value, "must be finite and non-negative"));
            }
        }
        let unit_fields = [
            ("scoring.discard_threshold", self.scoring.discard_threshold),
            ("resolver.synthesis_floor", self.resolver.synthesis_floor),
            ("resolver.unanimous_threshold", self.resolver.unanimous_threshold),
            ("evolution.prune_floor", self.evolution.prune_floor),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(out_of_range(field, value, "must be within [0, 1]"));
            }
        }
        let positive_fields = [
            ("workers", self.workers),
            ("resolver.breakdown_len", self.resolver.breakdown_len),
            ("session.query_capacity", self.session.query_capacity),
            ("session.momentum_capacity", self.session.momentum_capacity),
            ("session.intent_window", self.session.intent_window),
        ];
        for (field, value) in positive_fields {
            if value == 0 {
                return Err(out_of_range(field, value, "must be at least 1"));
            }
        }
        if let ConsensusProtocol::Synthesis { top_n: 0 } = self.default_protocol {
            return Err(out_of_range("default_protocol", "synthesis:0", "top_n must be at least 1"));
        }
        Ok(())
    }
}

fn override_with<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    slot: &mut T,
) -> ConfigResult<()> {
    let Some(raw) = lookup(var) else {
        return Ok(());
    };
    *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: raw.clone(),
    })?;
    Ok(())
}

fn out_of_range(field: &'static str, value: impl ToString, reason: &'static str) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        value: value.to_string(),
        reason,
    }
}
