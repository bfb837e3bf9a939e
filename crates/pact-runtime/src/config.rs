//! Process configuration.
//!
//! Read once at startup and handed to the workers by value. Layers,
//! each overriding the previous:
//!
//! 1. Compile-time defaults
//! 2. TOML config file (when a path is supplied)
//! 3. Environment variables (`PACT_*`)

use pact_types::ErrorCode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Process-wide configuration for the edge agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PactConfig {
    /// Endpoint of the ledger node the protocol handler talks to.
    pub ledger_url: String,

    /// Base URL of the marketplace registry.
    pub registry_url: String,

    /// Maximum seconds between agreement creation and ledger
    /// finalization before governance cancels the agreement.
    pub agreement_timeout_s: u64,

    /// Filesystem path of the agreement database. Defaults to
    /// `pact/agreements.redb` under the current directory when unset.
    pub store_path: Option<PathBuf>,
}

impl Default for PactConfig {
    fn default() -> Self {
        Self {
            ledger_url: "http://localhost:8545".into(),
            registry_url: "http://localhost:8080/v1".into(),
            agreement_timeout_s: 3_600,
            store_path: None,
        }
    }
}

impl PactConfig {
    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML for this
    /// schema.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Returns the agreement database path, falling back to the
    /// default location.
    #[must_use]
    pub fn store_path_or_default(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("pact").join("agreements.redb"))
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override `self` only where they differ from
    /// the compile-time default, which is what makes layering work.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.ledger_url != default.ledger_url {
            self.ledger_url = other.ledger_url.clone();
        }
        if other.registry_url != default.registry_url {
            self.registry_url = other.registry_url.clone();
        }
        if other.agreement_timeout_s != default.agreement_timeout_s {
            self.agreement_timeout_s = other.agreement_timeout_s;
        }
        if other.store_path.is_some() {
            self.store_path = other.store_path.clone();
        }
    }
}

/// Configuration load error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying io error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the schema.
    #[error("cannot parse config file {}: {source}", path.display())]
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// An environment variable held an unusable value.
    #[error("invalid environment variable {var}: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CONFIG_IO",
            Self::Parse { .. } => "CONFIG_PARSE",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Layered configuration loader.
///
/// # Example
///
/// ```no_run
/// use pact_runtime::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_config_path("/etc/pact/config.toml")
///     .load()
///     .expect("config");
/// assert!(config.agreement_timeout_s > 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with defaults only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML config file layer.
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Skips the environment variable layer. For tests.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Resolves the final configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file layer is unreadable or
    /// malformed, or an environment variable holds an unusable value.
    /// A missing config file is not an error; the layer is skipped.
    pub fn load(&self) -> Result<PactConfig, ConfigError> {
        let mut config = PactConfig::default();

        if let Some(path) = &self.config_path {
            if path.exists() {
                let file_layer = Self::load_file(path)?;
                config.merge(&file_layer);
                debug!(path = %path.display(), "config file layer applied");
            }
        }

        if !self.skip_env {
            Self::apply_env(&mut config)?;
        }

        Ok(config)
    }

    fn load_file(path: &Path) -> Result<PactConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        PactConfig::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(config: &mut PactConfig) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var("PACT_LEDGER_URL") {
            config.ledger_url = value;
        }
        if let Ok(value) = std::env::var("PACT_REGISTRY_URL") {
            config.registry_url = value;
        }
        if let Ok(value) = std::env::var("PACT_AGREEMENT_TIMEOUT_S") {
            config.agreement_timeout_s =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnvVar {
                        var: "PACT_AGREEMENT_TIMEOUT_S",
                        reason: format!("expected seconds, got '{}'", value),
                    })?;
        }
        if let Ok(value) = std::env::var("PACT_STORE_PATH") {
            config.store_path = Some(PathBuf::from(value));
        }
        Ok(())
    }
}
