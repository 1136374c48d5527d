//! Configuration loading and typed config structures for the Farmstead backend.
//!
//! The canonical configuration lives in `farmstead-config.yaml` at the
//! project root. Every section and field has a default, so an empty file
//! yields a runnable local setup: in-memory store, simulated ledger, and the
//! standard catalog.
//!
//! Environment variables override deployment-specific values:
//! - `DATABASE_URL` sets `infrastructure.database_url` and selects the
//!   `PostgreSQL` store
//! - `NATS_URL` sets `infrastructure.nats_url`
//! - `FARMSTEAD_SIGNER_KEY` sets `ledger.signer_key`
//! - `FARMSTEAD_PORT` sets `server.port`

use std::path::{Path, PathBuf};

use serde::Deserialize;

use farmstead_farm::{Catalog, FarmError, GameRules};
use farmstead_ledger::DEFAULT_SUBJECT_PREFIX;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "FARMSTEAD_CONFIG";

/// Configuration file used when neither an argument nor
/// [`CONFIG_PATH_ENV`] names one.
pub const DEFAULT_CONFIG_PATH: &str = "farmstead-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The rules or catalog section is inconsistent.
    #[error("invalid game configuration: {0}")]
    Game(#[from] FarmError),

    /// A setting has an unusable value.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// Dotted path of the offending setting.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level backend configuration.
///
/// Mirrors the structure of `farmstead-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FarmConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Ledger backend and voucher signing.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Tunable game rules.
    #[serde(default)]
    pub rules: GameRules,

    /// Game tables. The standard catalog is used when absent.
    #[serde(default)]
    pub catalog: Option<Catalog>,

    /// Seed for the game RNG. Drawn from the OS when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl FarmConfig {
    /// Load configuration from a YAML file, apply environment overrides, and
    /// validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and a validation error
    /// if the resulting configuration is inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise start from defaults. Environment
    /// overrides and validation apply either way.
    ///
    /// # Errors
    ///
    /// Same as [`FarmConfig::from_file`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Pick the config file: the explicit argument, then
    /// [`CONFIG_PATH_ENV`], then [`DEFAULT_CONFIG_PATH`].
    pub fn resolve_path(arg: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        arg.or_else(|| lookup(CONFIG_PATH_ENV))
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }

    /// Parse configuration from a YAML string without touching the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from `lookup`, normally [`std::env::var`].
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL") {
            self.infrastructure.database_url = Some(url);
        }
        if let Some(url) = lookup("NATS_URL") {
            self.infrastructure.nats_url = url;
        }
        if let Some(key) = lookup("FARMSTEAD_SIGNER_KEY") {
            self.ledger.signer_key = key;
        }
        match lookup("FARMSTEAD_PORT").map(|raw| raw.parse::<u16>()) {
            Some(Ok(port)) => self.server.port = port,
            Some(Err(e)) => tracing::warn!(error = %e, "Ignoring invalid FARMSTEAD_PORT"),
            None => {}
        }
    }

    /// Check rules, catalog, and ledger settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Game`] or [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        if let Some(catalog) = &self.catalog {
            catalog.validate()?;
        }
        if self.ledger.signer_key.is_empty() {
            return Err(ConfigError::Invalid {
                key: "ledger.signer_key",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.ledger.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "ledger.request_timeout_ms",
                reason: "must be positive".to_owned(),
            });
        }
        Ok(())
    }

    /// The configured catalog, or the standard one.
    pub fn catalog(&self) -> Catalog {
        self.catalog.clone().unwrap_or_default()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Expose `POST /api/dev/ledger/submit` when the ledger is simulated.
    #[serde(default = "default_true")]
    pub dev_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_routes: default_true(),
        }
    }
}

/// Infrastructure connection strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// `PostgreSQL` connection string. The in-memory store is used when
    /// absent.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum `PostgreSQL` pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// NATS messaging URL, used by the NATS ledger backend.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
            nats_url: default_nats_url(),
        }
    }
}

/// Which ledger the backend talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    /// In-process [`farmstead_ledger::SimulatedLedger`].
    #[default]
    Simulated,
    /// External ledger via [`farmstead_ledger::NatsLedger`].
    Nats,
}

/// Ledger and voucher settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: LedgerBackend,

    /// Voucher signing secret.
    #[serde(default = "default_signer_key")]
    pub signer_key: String,

    /// Signing domain name.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Chain id embedded in every voucher.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// NATS subject prefix for the relay.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// Timeout for nonce requests, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            signer_key: default_signer_key(),
            domain: default_domain(),
            chain_id: default_chain_id(),
            subject_prefix: default_subject_prefix(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_true() -> bool {
    true
}

const fn default_max_connections() -> u32 {
    8
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_owned()
}

fn default_signer_key() -> String {
    "farmstead-dev-signer".to_owned()
}

fn default_domain() -> String {
    "Farmstead".to_owned()
}

const fn default_chain_id() -> u64 {
    31_337
}

fn default_subject_prefix() -> String {
    DEFAULT_SUBJECT_PREFIX.to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    2_000
}
