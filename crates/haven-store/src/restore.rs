//! Manual backups and restore flows
//!
//! A manual backup is one composite object holding every document:
//!
//! ```json
//! {"version": "1.0", "timestamp": "...", "schemaVersion": 1, "bookings": [...], ...}
//! ```
//!
//! Restoring from an automatic snapshot writes the primary file directly and
//! takes no automatic snapshot of its own; the previous live value is kept as
//! a `before-restore` manual backup instead. Restoring a composite goes through
//! the regular save path, so every restored document gets a fresh snapshot.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::backup::{BackupListing, BackupStats, ManualKind};
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::store::{DocumentStore, ReadOutcome};

const COMPOSITE_VERSION: &str = "1.0";
const METADATA_KEYS: [&str; 4] = ["version", "timestamp", "exportedAt", "schemaVersion"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub success: bool,
    pub message: String,
    pub restored: Vec<Document>,
}

impl RestoreReport {
    fn succeeded(message: impl Into<String>, restored: Vec<Document>) -> Self {
        Self {
            success: true,
            message: message.into(),
            restored,
        }
    }

    fn failed(message: impl Into<String>, restored: Vec<Document>) -> Self {
        Self {
            success: false,
            message: message.into(),
            restored,
        }
    }
}

impl DocumentStore {
    /// Every document's current value in one object, not written anywhere.
    pub fn export_backup(&self) -> StoreResult<Value> {
        let mut composite = Map::new();
        composite.insert("version".into(), json!(COMPOSITE_VERSION));
        composite.insert(
            "timestamp".into(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        composite.insert("schemaVersion".into(), json!(self.migrator().current_version()));

        for document in Document::ALL {
            composite.insert(document.key().to_string(), self.load_value(document)?);
        }
        Ok(Value::Object(composite))
    }

    /// Write a full manual backup and return its file name.
    ///
    /// Every document is read through [`load_value`](Self::load_value), so
    /// under [`ReadPolicy::Escalate`](crate::ReadPolicy::Escalate) one
    /// unreadable document fails the whole backup and nothing is written.
    /// Under the default policy that document is backed up as its default.
    pub fn create_manual_backup(&self) -> StoreResult<String> {
        let composite = self.export_backup()?;
        let name = self.backups().write_manual(ManualKind::Full, &composite)?;
        tracing::info!(backup = %name, "manual backup created");
        Ok(name)
    }

    pub fn list_backups(&self) -> StoreResult<BackupListing> {
        self.backups().list()
    }

    pub fn backup_stats(&self) -> StoreResult<BackupStats> {
        self.backups().stats()
    }

    /// Put an automatic snapshot back as `document`'s live value.
    pub fn restore_automatic(&self, filename: &str, document: Document) -> RestoreReport {
        let _guard = self.lock(document);

        match self.try_restore_automatic(filename, document) {
            Ok(safety) => {
                tracing::info!(%document, backup = %filename, safety = %safety, "restored from automatic backup");
                RestoreReport::succeeded(
                    format!(
                        "Restored {} from {}; previous value saved as {}",
                        document, filename, safety
                    ),
                    vec![document],
                )
            }
            Err(e) => {
                tracing::warn!(%document, backup = %filename, error = %e, "restore failed");
                RestoreReport::failed(format!("Restore failed: {}", e), Vec::new())
            }
        }
    }

    fn try_restore_automatic(&self, filename: &str, document: Document) -> StoreResult<String> {
        let (owner, payload) = self.backups().read_auto(filename)?;
        if owner != document {
            return Err(StoreError::invalid_backup_name(
                filename,
                "snapshot belongs to a different document",
            ));
        }
        let (value, _) = self.migrator().upgrade(document, payload)?;

        let current = match self.read(document) {
            ReadOutcome::Loaded { value, .. } => value,
            ReadOutcome::NotFound => document.default_value(),
            unreadable => {
                tracing::warn!(
                    %document,
                    state = unreadable.label(),
                    "live value unreadable, safety backup holds the default"
                );
                document.default_value()
            }
        };
        let safety = self
            .backups()
            .write_manual(ManualKind::BeforeRestore(document), &current)?;

        self.write_primary(document, &self.migrator().wrap(&value))?;
        Ok(safety)
    }

    /// Save every known document found in a composite backup object.
    ///
    /// Documents are applied in registry order; the first failure stops the
    /// restore and the report lists what had already been written.
    pub fn restore_from_uploaded_backup(&self, backup: &Value) -> RestoreReport {
        let Some(entries) = backup.as_object() else {
            return RestoreReport::failed("Backup must be a JSON object", Vec::new());
        };
        let from = entries.get("schemaVersion").and_then(Value::as_u64).unwrap_or(0);

        let mut documents = Vec::new();
        let mut ignored = Vec::new();
        for (key, value) in entries {
            if METADATA_KEYS.contains(&key.as_str()) {
                continue;
            }
            match Document::from_key(key) {
                Some(document) => documents.push((document, value)),
                None => ignored.push(key.as_str()),
            }
        }
        if documents.is_empty() {
            return RestoreReport::failed("Backup contains no known documents", Vec::new());
        }
        documents.sort_by_key(|(document, _)| *document);

        let mut restored = Vec::new();
        for (document, value) in documents {
            if value.is_null() {
                continue;
            }
            let result = self.migrator().migrate(document, value.clone(), from).and_then(|value| {
                let _guard = self.lock(document);
                self.save(document, &value)
            });
            if let Err(e) = result {
                tracing::warn!(%document, error = %e, restored = restored.len(), "restore stopped");
                return RestoreReport::failed(
                    format!("Restore stopped at {}: {}", document, e),
                    restored,
                );
            }
            restored.push(document);
        }

        let mut message = format!("Restored {} document(s)", restored.len());
        if !ignored.is_empty() {
            tracing::debug!(?ignored, "ignored unknown backup keys");
            message.push_str(&format!("; ignored unknown keys: {}", ignored.join(", ")));
        }
        tracing::info!(restored = restored.len(), "restored from uploaded backup");
        RestoreReport::succeeded(message, restored)
    }

    /// Apply a manual backup file, full or `before-restore`.
    pub fn restore_manual(&self, filename: &str) -> RestoreReport {
        let (kind, value) = match self.backups().read_manual(filename) {
            Ok(read) => read,
            Err(e) => {
                tracing::warn!(backup = %filename, error = %e, "manual restore failed");
                return RestoreReport::failed(format!("Restore failed: {}", e), Vec::new());
            }
        };

        match kind {
            ManualKind::Full => self.restore_from_uploaded_backup(&value),
            ManualKind::BeforeRestore(document) => {
                let mut single = Map::new();
                single.insert("schemaVersion".into(), json!(self.migrator().current_version()));
                single.insert(document.key().to_string(), value);
                self.restore_from_uploaded_backup(&Value::Object(single))
            }
        }
    }
}
