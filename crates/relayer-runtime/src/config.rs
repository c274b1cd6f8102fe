//! # Relayer Configuration
//!
//! One TOML file covering every subsystem. Missing sections and fields take
//! their defaults, so an empty file is a valid single-pair dev-net.
//!
//! ```toml
//! chains = ["eth", "bsc"]
//!
//! [storage]
//! backend = "memory"          # or "rocksdb"
//! data_dir = "./data"
//!
//! [pipeline]
//! source_chains = ["eth"]
//! max_concurrency = 16
//!
//! [committee]
//! size = 4                    # threshold defaults to n - floor((n-1)/3)
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `XC_DATA_DIR` | `storage.data_dir` |
//! | `XC_POLL_INTERVAL_MS` | `pipeline.poll_interval_ms` |
//! | `XC_LOG_LEVEL` (else `RUST_LOG`) | `logging.level` |
//! | `XC_JSON_LOGS` | `logging.json` |

use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xc_01_trust_store::TrustStoreConfig;
use xc_02_endorsement::CoordinatorConfig;
use xc_03_message_tracker::RetryPolicy;
use xc_04_relay_pipeline::PipelineConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `RelayerConfig`.
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value for {var}: {value}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },

    /// Settings are inconsistent or out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tracker storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile in-memory store.
    #[default]
    Memory,
    /// RocksDB under `data_dir` (requires the `rocksdb` feature).
    Rocksdb,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend selection.
    pub backend: StorageBackend,
    /// Data directory for durable backends.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Local dev-net committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitteeConfig {
    /// Number of in-process members.
    pub size: usize,
    /// Explicit quorum threshold; byzantine default when absent.
    pub threshold: Option<usize>,
    /// First committee epoch id.
    pub epoch_id: u64,
}

impl Default for CommitteeConfig {
    fn default() -> Self {
        Self {
            size: 4,
            threshold: None,
            epoch_id: 1,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `xc_04_relay_pipeline=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete relayer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayerConfig {
    /// Every chain the relayer can reach.
    pub chains: Vec<ChainId>,
    /// Tracker storage.
    pub storage: StorageConfig,
    /// Relay pipeline.
    pub pipeline: PipelineConfig,
    /// Retry and backoff policy.
    pub retry: RetryPolicy,
    /// Endorsement coordinator.
    pub coordinator: CoordinatorConfig,
    /// Certificate trust store.
    pub trust: TrustStoreConfig,
    /// Dev-net committee.
    pub committee: CommitteeConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        let eth = ChainId::new("eth");
        let bsc = ChainId::new("bsc");
        let chains: Vec<ChainId> = [eth, bsc].into_iter().flatten().collect();
        Self {
            pipeline: PipelineConfig {
                source_chains: chains.first().cloned().into_iter().collect(),
                ..PipelineConfig::default()
            },
            chains,
            storage: StorageConfig::default(),
            retry: RetryPolicy::default(),
            coordinator: CoordinatorConfig::default(),
            trust: TrustStoreConfig::default(),
            committee: CommitteeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RelayerConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `XC_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `XC_*` overrides from an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("XC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("XC_POLL_INTERVAL_MS") {
            self.pipeline.poll_interval_ms = value.parse().map_err(|_| ConfigError::Env {
                var: "XC_POLL_INTERVAL_MS",
                value: value.clone(),
            })?;
        }
        if let Some(level) = lookup("XC_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.logging.level = level;
        }
        if let Some(value) = lookup("XC_JSON_LOGS") {
            self.logging.json = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::Env {
                        var: "XC_JSON_LOGS",
                        value,
                    })
                }
            };
        }
        Ok(())
    }

    /// Reject configurations the relayer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.coordinator.member_timeout_ms == 0 {
            return Err(invalid("coordinator.member_timeout_ms must be > 0"));
        }
        if self.trust.bcdns_timeout_ms == 0 {
            return Err(invalid("trust.bcdns_timeout_ms must be > 0"));
        }
        if self.trust.max_chain_depth == 0 {
            return Err(invalid("trust.max_chain_depth must be > 0"));
        }
        if self.retry.base_delay_ms == 0 || self.retry.multiplier == 0 {
            return Err(invalid("retry.base_delay_ms and retry.multiplier must be > 0"));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(invalid("retry.max_delay_ms must be >= retry.base_delay_ms"));
        }

        if self.committee.size == 0 {
            return Err(invalid("committee.size must be > 0"));
        }
        if let Some(t) = self.committee.threshold {
            if t == 0 || t > self.committee.size {
                return Err(invalid(format!(
                    "committee.threshold {t} outside 1..={}",
                    self.committee.size
                )));
            }
        }

        if self.chains.is_empty() {
            return Err(invalid("at least one chain must be configured"));
        }
        for chain in &self.pipeline.source_chains {
            if !self.chains.contains(chain) {
                return Err(invalid(format!("source chain {chain} is not in `chains`")));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_valid() {
        let config = RelayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.pipeline.source_chains, vec![ChainId::new("eth").unwrap()]);
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = RelayerConfig::from_toml(
            r#"
            chains = ["eth", "bsc", "sol"]

            [pipeline]
            source_chains = ["eth", "sol"]
            max_concurrency = 4

            [committee]
            size = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.max_concurrency, 4);
        assert_eq!(config.pipeline.poll_interval_ms, 1_000);
        assert_eq!(config.committee.size, 7);
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_chain_id_rejected_at_parse() {
        assert!(matches!(
            RelayerConfig::from_toml(r#"chains = ["eth/main"]"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_source_chain_rejected() {
        let config = RelayerConfig::from_toml(
            r#"
            chains = ["eth"]
            [pipeline]
            source_chains = ["sol"]
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let mut config = RelayerConfig::default();
        config.committee.threshold = Some(5);
        assert!(config.validate().is_err());
        config.committee.threshold = Some(0);
        assert!(config.validate().is_err());
        config.committee.threshold = Some(4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = RelayerConfig::default();
        config.coordinator.member_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RelayerConfig::default();
        config.pipeline.chain_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("XC_DATA_DIR", "/var/lib/relayer"),
            ("XC_POLL_INTERVAL_MS", "250"),
            ("XC_LOG_LEVEL", "debug"),
            ("XC_JSON_LOGS", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = RelayerConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/relayer"));
        assert_eq!(config.pipeline.poll_interval_ms, 250);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_bad_env_value_rejected() {
        let mut config = RelayerConfig::default();
        let result = config.apply_overrides(|k| {
            (k == "XC_POLL_INTERVAL_MS").then(|| "soon".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::Env {
                var: "XC_POLL_INTERVAL_MS",
                ..
            })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayer.toml");
        std::fs::write(&path, "[storage]\nbackend = \"rocksdb\"\n").unwrap();

        let config = RelayerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Rocksdb);

        let missing = RelayerConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
