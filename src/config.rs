//! Configuration module for chute.

use serde::Deserialize;
use std::path::Path;

use crate::{ChuteError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty list means any origin is accepted.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size per request in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload_size() -> u64 {
    25
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Transfer lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Lifetime of an uploaded file group in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Interval between reaper sweeps in seconds.
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,
    /// Minimum age in seconds before an unregistered blob is reclaimed.
    #[serde(default = "default_orphan_grace")]
    pub orphan_grace_secs: u64,
    /// Maximum number of live groups (0 = unbounded).
    #[serde(default)]
    pub max_live_groups: usize,
}

fn default_ttl() -> u64 {
    3600
}

fn default_reap_interval() -> u64 {
    900
}

fn default_orphan_grace() -> u64 {
    3600
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            reap_interval_secs: default_reap_interval(),
            orphan_grace_secs: default_orphan_grace(),
            max_live_groups: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/chute.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Transfer lifecycle configuration.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ChuteError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ChuteError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `CHUTE_STORAGE_PATH`: Override the blob storage directory
    pub fn apply_env_overrides(&mut self) {
        // Storage path from environment variable (highest priority)
        if let Ok(path) = std::env::var("CHUTE_STORAGE_PATH") {
            if !path.is_empty() {
                self.storage.path = path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - `ttl_secs` or `reap_interval_secs` is zero
    /// - `max_upload_size_mb` is zero
    pub fn validate(&self) -> Result<()> {
        if self.transfer.ttl_secs == 0 {
            return Err(ChuteError::Validation(
                "transfer.ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.transfer.reap_interval_secs == 0 {
            return Err(ChuteError::Validation(
                "transfer.reap_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(ChuteError::Validation(
                "storage.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum upload size per request in bytes.
    pub fn max_upload_size_bytes(&self) -> usize {
        (self.storage.max_upload_size_mb as usize) * 1024 * 1024
    }
}
