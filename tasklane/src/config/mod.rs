//! Configuration for the `tasklane` binary.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasklane/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that doesn't exist is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::{DEFAULT_SUCCESS_MESSAGE_TIMEOUT, StoreConfig};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreFileConfig,
    storage: StorageFileConfig,
    display: DisplayFileConfig,
}

/// `[store]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    success_message_timeout_ms: Option<u64>,
    intent_buffer: Option<usize>,
}

/// `[storage]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    snapshot_path: Option<PathBuf>,
}

/// `[display]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DisplayFileConfig {
    timestamp_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// How long success messages stay visible.
    pub success_message_timeout: Duration,
    /// Capacity of the intent channel feeding the store.
    pub intent_buffer: usize,
    /// Snapshot file; `None` keeps tasks in memory only.
    pub snapshot_path: Option<PathBuf>,
    /// Timestamp display format (chrono).
    pub timestamp_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            success_message_timeout: DEFAULT_SUCCESS_MESSAGE_TIMEOUT,
            intent_buffer: 64,
            snapshot_path: None,
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit config file cannot be read,
    /// or if any config file cannot be parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            success_message_timeout: file
                .store
                .success_message_timeout_ms
                .map_or(defaults.success_message_timeout, Duration::from_millis),
            intent_buffer: file
                .store
                .intent_buffer
                .filter(|&n| n > 0)
                .unwrap_or(defaults.intent_buffer),
            snapshot_path: cli
                .snapshot
                .clone()
                .or_else(|| file.storage.snapshot_path.clone()),
            timestamp_format: cli
                .timestamp_format
                .clone()
                .or_else(|| file.display.timestamp_format.clone())
                .unwrap_or(defaults.timestamp_format),
        }
    }

    /// Settings for the state store.
    #[must_use]
    pub const fn to_store_config(&self) -> StoreConfig {
        StoreConfig {
            success_message_timeout: self.success_message_timeout,
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Intent-driven task list")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/tasklane/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Snapshot file to load tasks from and save them to.
    #[arg(long, env = "TASKLANE_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Timestamp display format (chrono format string).
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKLANE_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/tasklane.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Load and parse a TOML config file.
///
/// An explicit path must exist; the default path may be missing.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(path) = explicit_path {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("tasklane").join("config.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
