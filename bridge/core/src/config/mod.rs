//! TOML Configuration File Support
//!
//! Centralized configuration for the bridge, the document helpers and the
//! default generation backend, read from
//! `$XDG_CONFIG_HOME/token-bridge/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [bridge]
//! timeout_ms = 30000
//! block = true
//! poll_interval_ms = 10
//! timeout_policy = "retry"
//!
//! [chunking]
//! enabled = true
//! chunk_size = 512
//! head_size = 50
//! store = "chroma"
//!
//! [backend]
//! host = "localhost"
//! port = 11434
//! model = "llama3.2"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{OLLAMA_DEFAULT_HOST, OLLAMA_DEFAULT_PORT};
use crate::documents::{ChunkOptions, VectorStoreKind};
use crate::streaming::{BridgeOptions, TimeoutPolicy};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// How a timed-out pull attempt is reported, as written in TOML
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicyToml {
    /// Retry the attempt
    Retry,
    /// End the stream
    EndOfStream,
}

impl From<TimeoutPolicyToml> for TimeoutPolicy {
    fn from(value: TimeoutPolicyToml) -> Self {
        match value {
            TimeoutPolicyToml::Retry => Self::Retry,
            TimeoutPolicyToml::EndOfStream => Self::EndOfStream,
        }
    }
}

/// Bridge section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSectionToml {
    /// Per-attempt pull timeout in milliseconds (0 = wait indefinitely)
    pub timeout_ms: Option<u64>,

    /// Whether pulls wait for items
    pub block: Option<bool>,

    /// Wait slice in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Timeout policy
    pub timeout_policy: Option<TimeoutPolicyToml>,
}

/// Chunking section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingToml {
    /// Whether documents are split
    pub enabled: Option<bool>,

    /// Maximum chunk length in characters
    pub chunk_size: Option<usize>,

    /// Preview length stored in `head`
    pub head_size: Option<usize>,

    /// Target vector store
    pub store: Option<VectorStoreKind>,
}

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Ollama host
    pub host: Option<String>,

    /// Ollama port
    pub port: Option<u16>,

    /// Default model
    pub model: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeToml {
    /// Bridge configuration section
    pub bridge: BridgeSectionToml,

    /// Chunking configuration section
    pub chunking: ChunkingToml,

    /// Backend configuration section
    pub backend: BackendToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Backend connection settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    /// Ollama host
    pub host: String,
    /// Ollama port
    pub port: u16,
    /// Default model
    pub model: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            host: OLLAMA_DEFAULT_HOST.to_string(),
            port: OLLAMA_DEFAULT_PORT,
            model: "llama3.2".to_string(),
        }
    }
}

/// Resolved configuration from every source
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Bridge options
    pub bridge: BridgeOptions,

    /// Chunking options
    pub chunking: ChunkOptions,

    /// Preview length stored in `head`
    pub head_size: usize,

    /// Backend settings
    pub backend: BackendSettings,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeOptions::default(),
            chunking: ChunkOptions::default(),
            head_size: 50,
            backend: BackendSettings::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero chunk size or a
    /// zero poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.bridge.poll_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/token-bridge/config.toml` or
/// `~/.config/token-bridge/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("token-bridge").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<BridgeConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment variables through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BridgeConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: BridgeToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut BridgeConfig, toml: &BridgeToml) {
    // Bridge settings
    if let Some(timeout) = toml.bridge.timeout_ms {
        config.bridge.timeout = millis_or_none(timeout);
    }
    if let Some(block) = toml.bridge.block {
        config.bridge.block = block;
    }
    if let Some(interval) = toml.bridge.poll_interval_ms {
        config.bridge.poll_interval = Duration::from_millis(interval);
    }
    if let Some(policy) = toml.bridge.timeout_policy {
        config.bridge.timeout_policy = policy.into();
    }

    // Chunking settings
    if let Some(enabled) = toml.chunking.enabled {
        config.chunking.enabled = enabled;
    }
    if let Some(size) = toml.chunking.chunk_size {
        config.chunking.chunk_size = size;
    }
    if let Some(size) = toml.chunking.head_size {
        config.head_size = size;
    }
    if let Some(store) = toml.chunking.store {
        config.chunking.store = store;
    }

    // Backend settings
    if let Some(ref host) = toml.backend.host {
        config.backend.host.clone_from(host);
    }
    if let Some(port) = toml.backend.port {
        config.backend.port = port;
    }
    if let Some(ref model) = toml.backend.model {
        config.backend.model.clone_from(model);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut BridgeConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(timeout) = env("TOKEN_BRIDGE_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.bridge.timeout = millis_or_none(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(block) = env("TOKEN_BRIDGE_BLOCK") {
        config.bridge.block = block != "0" && block.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(interval) = env("TOKEN_BRIDGE_POLL_INTERVAL_MS") {
        if let Ok(ms) = interval.parse::<u64>() {
            config.bridge.poll_interval = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(size) = env("TOKEN_BRIDGE_CHUNK_SIZE") {
        if let Ok(n) = size.parse::<usize>() {
            config.chunking.chunk_size = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(store) = env("TOKEN_BRIDGE_STORE") {
        match store.parse() {
            Ok(kind) => {
                config.chunking.store = kind;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring TOKEN_BRIDGE_STORE"),
        }
    }

    // Backend settings from environment
    if let Some(host) = env("OLLAMA_HOST") {
        config.backend.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("OLLAMA_PORT") {
        if let Ok(p) = port.parse::<u16>() {
            config.backend.port = p;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(model) = env("TOKEN_BRIDGE_MODEL") {
        config.backend.model = model;
        config.source = ConfigSource::Env;
    }
}

fn millis_or_none(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// =============================================================================
// Tests
// =============================================================================
