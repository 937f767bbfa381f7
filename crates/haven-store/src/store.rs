//! The document store
//!
//! Maps each [`Document`] to `<data_dir>/<stem>.enc`. Loads re-read and
//! decrypt from disk every time; there is no cache. Every save is followed
//! by an automatic snapshot through the [`BackupManager`].

use haven_crypto::{Cipher, CipherError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::backup::BackupManager;
use crate::config::{ReadPolicy, StoreConfig};
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::files;
use crate::lock::{DocumentGuard, DocumentLocks};
use crate::schema::SchemaMigrator;

/// What reading a primary file produced.
#[derive(Debug)]
pub enum ReadOutcome {
    Loaded { value: Value, schema_version: u64 },
    /// Never saved
    NotFound,
    /// Written in a pre-envelope format; abandoned until the next save
    Legacy,
    Corrupted(String),
    /// Authentication failed: wrong key or tampered bytes
    KeyMismatch,
    Unreadable(io::Error),
}

impl ReadOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReadOutcome::Loaded { .. } => "ok",
            ReadOutcome::NotFound => "missing",
            ReadOutcome::Legacy => "legacy",
            ReadOutcome::Corrupted(_) => "corrupted",
            ReadOutcome::KeyMismatch => "key-mismatch",
            ReadOutcome::Unreadable(_) => "unreadable",
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ReadOutcome::Loaded { .. })
    }
}

/// Health of one primary file, as reported by [`DocumentStore::status`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub document: Document,
    pub file: String,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u64>,
}

pub struct DocumentStore {
    config: StoreConfig,
    cipher: Arc<Cipher>,
    backups: BackupManager,
    locks: DocumentLocks,
    migrator: SchemaMigrator,
}

impl DocumentStore {
    /// Open (and create if needed) the data directory and its backup folders.
    pub fn open(config: StoreConfig, cipher: Cipher) -> StoreResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| StoreError::io("create data directory", &config.data_dir, e))?;

        let cipher = Arc::new(cipher);
        let backups = BackupManager::new(&config, Arc::clone(&cipher));
        backups.ensure_dirs()?;

        for dir in [config.data_dir.as_path(), backups.auto_dir(), backups.manual_dir()] {
            match files::remove_stale_temps(dir, files::STALE_TEMP_AGE) {
                Ok(0) => {}
                Ok(removed) => tracing::info!(dir = %dir.display(), removed, "removed stale temp files"),
                Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "could not clean temp files"),
            }
        }

        tracing::info!(
            data_dir = %config.data_dir.display(),
            algorithm = ?cipher.algorithm(),
            key = %cipher.fingerprint(),
            "document store opened"
        );

        Ok(Self {
            config,
            cipher,
            backups,
            locks: DocumentLocks::new(),
            migrator: SchemaMigrator::default(),
        })
    }

    pub fn with_migrator(mut self, migrator: SchemaMigrator) -> Self {
        self.migrator = migrator;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn migrator(&self) -> &SchemaMigrator {
        &self.migrator
    }

    pub fn path(&self, document: Document) -> PathBuf {
        self.config.data_dir.join(document.file_name())
    }

    /// Read and classify a primary file without applying any policy.
    pub fn read(&self, document: Document) -> ReadOutcome {
        let bytes = match fs::read(self.path(document)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return ReadOutcome::NotFound,
            Err(e) => return ReadOutcome::Unreadable(e),
        };
        let Ok(text) = String::from_utf8(bytes) else {
            return ReadOutcome::Corrupted("file is not valid UTF-8".to_string());
        };

        let payload = match self.cipher.open(&text) {
            Ok(payload) => payload,
            Err(CipherError::Legacy) => return ReadOutcome::Legacy,
            Err(CipherError::Authentication) => return ReadOutcome::KeyMismatch,
            Err(e) => return ReadOutcome::Corrupted(e.to_string()),
        };

        match self.migrator.upgrade(document, payload) {
            Ok((value, schema_version)) => ReadOutcome::Loaded { value, schema_version },
            Err(e) => ReadOutcome::Corrupted(e.to_string()),
        }
    }

    /// Load `document`, or `default` if it was never saved. Other failures
    /// follow the configured [`ReadPolicy`].
    pub fn load<T: DeserializeOwned>(&self, document: Document, default: T) -> StoreResult<T> {
        match self.read(document) {
            ReadOutcome::Loaded { value, .. } => match serde_json::from_value(value) {
                Ok(loaded) => Ok(loaded),
                Err(e) => self.degraded(StoreError::corrupted(document, e.to_string()), default),
            },
            ReadOutcome::NotFound => Ok(default),
            ReadOutcome::Legacy => {
                tracing::info!(%document, "legacy encrypted data detected - will be migrated on next save");
                Ok(default)
            }
            ReadOutcome::Corrupted(reason) => self.degraded(StoreError::corrupted(document, reason), default),
            ReadOutcome::KeyMismatch => self.degraded(StoreError::KeyMismatch { document }, default),
            ReadOutcome::Unreadable(e) => {
                self.degraded(StoreError::io("read document", self.path(document), e), default)
            }
        }
    }

    /// Load with the document's registered default.
    pub fn load_value(&self, document: Document) -> StoreResult<Value> {
        self.load(document, document.default_value())
    }

    fn degraded<T>(&self, err: StoreError, default: T) -> StoreResult<T> {
        match self.config.read_policy {
            ReadPolicy::FallbackToDefault => {
                tracing::warn!(error = %err, "read failed, using default value");
                Ok(default)
            }
            ReadPolicy::Escalate => {
                tracing::error!(error = %err, "read failed");
                Err(err)
            }
        }
    }

    /// Replace `document` with `value`, then take an automatic snapshot.
    ///
    /// Does not take the document lock; callers doing load-modify-save
    /// should use [`update`](Self::update).
    pub fn save<T: Serialize + ?Sized>(&self, document: Document, value: &T) -> StoreResult<()> {
        let payload = self.migrator.wrap(value);
        self.write_primary(document, &payload)?;
        self.backups.create_auto_backup(document, &payload);
        Ok(())
    }

    /// Seal and atomically write the primary file. No snapshot.
    pub(crate) fn write_primary<T: Serialize + ?Sized>(&self, document: Document, payload: &T) -> StoreResult<()> {
        let envelope = self
            .cipher
            .encrypt(payload)
            .ok_or(StoreError::Encryption { document })?;

        let path = self.path(document);
        files::atomic_write(&path, envelope.as_bytes())
            .map_err(|e| StoreError::io("write document", &path, e))?;

        tracing::debug!(%document, bytes = envelope.len(), "document written");
        Ok(())
    }

    /// Load, mutate and save `document` while holding its lock.
    pub fn update<T, F, R>(&self, document: Document, default: T, mutate: F) -> StoreResult<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.lock(document);
        let mut value = self.load(document, default)?;
        let result = mutate(&mut value);
        self.save(document, &value)?;
        Ok(result)
    }

    /// Hold `document`'s in-process lock until the guard drops.
    pub fn lock(&self, document: Document) -> DocumentGuard<'_> {
        self.locks.acquire(document)
    }

    /// Classify every primary file. Read-only.
    pub fn status(&self) -> Vec<DocumentStatus> {
        Document::ALL
            .into_iter()
            .map(|document| {
                let size = fs::metadata(self.path(document)).ok().map(|m| m.len());
                let outcome = self.read(document);
                let state = outcome.label();
                let (detail, schema_version) = match outcome {
                    ReadOutcome::Loaded { schema_version, .. } => (None, Some(schema_version)),
                    ReadOutcome::Corrupted(reason) => (Some(reason), None),
                    ReadOutcome::Unreadable(e) => (Some(e.to_string()), None),
                    _ => (None, None),
                };
                DocumentStatus {
                    document,
                    file: document.file_name(),
                    state,
                    detail,
                    size,
                    schema_version,
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("config", &self.config)
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}
