//! Store configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `HAVEN_`-prefixed environment variables (nested keys use `__`,
//! e.g. `HAVEN_RETENTION__MAX_AUTO_BACKUPS=100`).
//!
//! The passphrase is deliberately not part of this struct.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use haven_crypto::{Algorithm, Passphrase};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

pub const DEFAULT_CONFIG_FILE: &str = "haven.toml";
pub const ENV_PREFIX: &str = "HAVEN_";
pub const PASSPHRASE_ENV: &str = "HAVEN_PASSPHRASE";
/// Variable name used by existing deployments
pub const LEGACY_PASSPHRASE_ENV: &str = "ENCRYPTION_KEY";

/// What `load` does when a document exists but cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadPolicy {
    /// Log and return the caller's default
    #[default]
    FallbackToDefault,
    /// Return the error to the caller
    Escalate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManualBackupFormat {
    /// Envelope text, same cipher as the primary files
    #[default]
    Encrypted,
    /// Pretty-printed JSON, readable without the key
    Plaintext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Automatic snapshots kept per document
    pub max_auto_backups: usize,
    /// Manual snapshots kept in total
    pub max_manual_backups: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_auto_backups: 50,
            max_manual_backups: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub algorithm: Algorithm,
    pub read_policy: ReadPolicy,
    pub manual_backup_format: ManualBackupFormat,
    pub retention: RetentionPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            algorithm: Algorithm::default(),
            read_policy: ReadPolicy::default(),
            manual_backup_format: ManualBackupFormat::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Defaults, then `config_file` (or `haven.toml` if present), then env.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let file = config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(StoreConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["passphrase"]))
    }

    pub fn load(config_file: Option<&Path>) -> StoreResult<Self> {
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(StoreError::config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
        }

        let config: StoreConfig = Self::figment(config_file)
            .extract()
            .map_err(|e| StoreError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(StoreError::config("data_dir must be set"));
        }
        if self.retention.max_auto_backups == 0 {
            return Err(StoreError::config("retention.max_auto_backups must be at least 1"));
        }
        if self.retention.max_manual_backups == 0 {
            return Err(StoreError::config("retention.max_manual_backups must be at least 1"));
        }
        Ok(())
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    pub fn auto_backup_dir(&self) -> PathBuf {
        self.backup_dir().join("auto")
    }

    pub fn manual_backup_dir(&self) -> PathBuf {
        self.backup_dir().join("manual")
    }
}

/// Read the passphrase from `HAVEN_PASSPHRASE`, falling back to `ENCRYPTION_KEY`.
pub fn passphrase_from_env() -> StoreResult<Passphrase> {
    let raw = std::env::var(PASSPHRASE_ENV)
        .or_else(|_| std::env::var(LEGACY_PASSPHRASE_ENV))
        .map_err(|_| {
            StoreError::config(format!(
                "set {} (or {}) to the data passphrase",
                PASSPHRASE_ENV, LEGACY_PASSPHRASE_ENV
            ))
        })?;
    Passphrase::new(raw).map_err(|e| StoreError::config(e.to_string()))
}
