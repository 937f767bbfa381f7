//! Automatic and manual backups
//!
//! Layout under the data directory:
//!
//! ```text
//! backups/auto/<stem>_<timestamp>.enc
//! backups/manual/backup-<timestamp>.json
//! backups/manual/backup-before-restore-<stem>-<timestamp>.json
//! ```
//!
//! `<timestamp>` is UTC ISO-8601 with `:` and `.` replaced by `-`, so names
//! sort chronologically. Listing never decrypts anything.

use chrono::{DateTime, Duration, Utc};
use haven_crypto::Cipher;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ManualBackupFormat, RetentionPolicy, StoreConfig};
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::files::{self, DirEntryInfo};

const AUTO_SUFFIX: &str = ".enc";
const MANUAL_PREFIX: &str = "backup-";
const MANUAL_SUFFIX: &str = ".json";
const BEFORE_RESTORE_PREFIX: &str = "backup-before-restore-";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

/// Filesystem-safe timestamp, e.g. `2024-05-01T09-30-00-123Z`.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// What a manual backup file captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "document", rename_all = "camelCase")]
pub enum ManualKind {
    /// Every document at once
    Full,
    /// One document's live value, taken just before it was restored over
    BeforeRestore(Document),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBackupEntry {
    pub name: String,
    pub document: Option<Document>,
    pub timestamp: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualBackupEntry {
    pub name: String,
    #[serde(flatten)]
    pub kind: ManualKind,
    pub timestamp: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupListing {
    pub auto: Vec<AutoBackupEntry>,
    pub manual: Vec<ManualBackupEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBackupStats {
    pub total: usize,
    pub total_size: u64,
    pub per_document: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualBackupStats {
    pub total: usize,
    pub total_size: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStats {
    pub auto_backups: AutoBackupStats,
    pub manual_backups: ManualBackupStats,
    pub oldest_backup: Option<DateTime<Utc>>,
    pub newest_backup: Option<DateTime<Utc>>,
}

/// `(stem, timestamp)` from `<stem>_<timestamp>.enc`.
pub fn parse_auto_name(name: &str) -> Option<(&str, &str)> {
    let base = name.strip_suffix(AUTO_SUFFIX)?;
    let (stem, timestamp) = base.rsplit_once('_')?;
    if stem.is_empty() || timestamp.is_empty() {
        return None;
    }
    Some((stem, timestamp))
}

/// Kind and timestamp from a manual backup file name.
pub fn parse_manual_name(name: &str) -> Option<(ManualKind, &str)> {
    let base = name.strip_suffix(MANUAL_SUFFIX)?;
    if let Some(rest) = base.strip_prefix(BEFORE_RESTORE_PREFIX) {
        // stems never contain '-', timestamps always do
        let (stem, timestamp) = rest.split_once('-')?;
        let document = Document::from_file_stem(stem)?;
        return Some((ManualKind::BeforeRestore(document), timestamp));
    }
    let timestamp = base.strip_prefix(MANUAL_PREFIX)?;
    (!timestamp.is_empty()).then_some((ManualKind::Full, timestamp))
}

fn is_auto_backup_of(name: &str, document: Document) -> bool {
    name.ends_with(AUTO_SUFFIX)
        && name
            .strip_prefix(document.file_stem())
            .map_or(false, |rest| rest.starts_with('_'))
}

fn is_manual_backup(name: &str) -> bool {
    name.starts_with(MANUAL_PREFIX) && name.ends_with(MANUAL_SUFFIX)
}

/// Reject anything that could step outside the backup directory.
fn check_plain_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::invalid_backup_name(name, "empty name"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") || name.contains('\0') {
        return Err(StoreError::invalid_backup_name(name, "must be a plain file name"));
    }
    Ok(())
}

pub struct BackupManager {
    auto_dir: PathBuf,
    manual_dir: PathBuf,
    retention: RetentionPolicy,
    manual_format: ManualBackupFormat,
    cipher: Arc<Cipher>,
}

impl BackupManager {
    pub fn new(config: &StoreConfig, cipher: Arc<Cipher>) -> Self {
        Self {
            auto_dir: config.auto_backup_dir(),
            manual_dir: config.manual_backup_dir(),
            retention: config.retention,
            manual_format: config.manual_backup_format,
            cipher,
        }
    }

    pub fn auto_dir(&self) -> &Path {
        &self.auto_dir
    }

    pub fn manual_dir(&self) -> &Path {
        &self.manual_dir
    }

    pub fn ensure_dirs(&self) -> StoreResult<()> {
        for dir in [&self.auto_dir, &self.manual_dir] {
            fs::create_dir_all(dir).map_err(|e| StoreError::io("create backup directory", dir, e))?;
        }
        Ok(())
    }

    /// Snapshot one document after a save, then rotate. Never fails the
    /// caller: problems are logged and the snapshot is skipped.
    pub fn create_auto_backup<T: Serialize + ?Sized>(&self, document: Document, payload: &T) -> Option<String> {
        match self.try_create_auto_backup(document, payload) {
            Ok(name) => {
                self.rotate_auto_backups(document);
                Some(name)
            }
            Err(e) => {
                tracing::warn!(%document, error = %e, "auto-backup failed");
                None
            }
        }
    }

    fn try_create_auto_backup<T: Serialize + ?Sized>(&self, document: Document, payload: &T) -> StoreResult<String> {
        let envelope = self
            .cipher
            .encrypt(payload)
            .ok_or(StoreError::Encryption { document })?;

        let stem = document.file_stem();
        let (name, path) = unique_name(&self.auto_dir, |ts| format!("{}_{}{}", stem, ts, AUTO_SUFFIX));
        files::atomic_write(&path, envelope.as_bytes())
            .map_err(|e| StoreError::io("write auto-backup", &path, e))?;

        tracing::debug!(%document, backup = %name, "auto-backup written");
        Ok(name)
    }

    /// Keep the newest `max_auto_backups` snapshots of `document`.
    /// Returns how many were deleted.
    pub fn rotate_auto_backups(&self, document: Document) -> usize {
        let keep = self.retention.max_auto_backups;
        match rotate(&self.auto_dir, |name| is_auto_backup_of(name, document), keep) {
            Ok(removed) => {
                if removed > 0 {
                    tracing::debug!(%document, removed, "rotated auto-backups");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(%document, error = %e, "backup rotation failed");
                0
            }
        }
    }

    /// Keep the newest `max_manual_backups` manual snapshots.
    pub fn rotate_manual_backups(&self) -> usize {
        match rotate(&self.manual_dir, is_manual_backup, self.retention.max_manual_backups) {
            Ok(removed) => {
                if removed > 0 {
                    tracing::debug!(removed, "rotated manual backups");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "manual backup rotation failed");
                0
            }
        }
    }

    /// Write a manual snapshot in the configured format, then rotate.
    pub fn write_manual(&self, kind: ManualKind, value: &Value) -> StoreResult<String> {
        let body = match self.manual_format {
            ManualBackupFormat::Encrypted => self
                .cipher
                .seal(value)
                .map_err(|e| StoreError::BackupEncryption(e.to_string()))?,
            ManualBackupFormat::Plaintext => serde_json::to_string_pretty(value)
                .map_err(|e| StoreError::serialization("manual backup", e))?,
        };

        let (name, path) = unique_name(&self.manual_dir, |ts| match kind {
            ManualKind::Full => format!("{}{}{}", MANUAL_PREFIX, ts, MANUAL_SUFFIX),
            ManualKind::BeforeRestore(document) => {
                format!("{}{}-{}{}", BEFORE_RESTORE_PREFIX, document.file_stem(), ts, MANUAL_SUFFIX)
            }
        });
        files::atomic_write(&path, body.as_bytes())
            .map_err(|e| StoreError::io("write manual backup", &path, e))?;

        tracing::info!(backup = %name, format = ?self.manual_format, "manual backup written");
        self.rotate_manual_backups();
        Ok(name)
    }

    /// Path of an automatic snapshot; the name must belong to a known document.
    pub fn auto_backup_path(&self, name: &str) -> StoreResult<(Document, PathBuf)> {
        check_plain_name(name)?;
        let (stem, _) = parse_auto_name(name)
            .ok_or_else(|| StoreError::invalid_backup_name(name, "not an automatic backup name"))?;
        let document = Document::from_file_stem(stem)
            .ok_or_else(|| StoreError::invalid_backup_name(name, "unknown document"))?;
        Ok((document, self.auto_dir.join(name)))
    }

    pub fn manual_backup_path(&self, name: &str) -> StoreResult<(ManualKind, PathBuf)> {
        check_plain_name(name)?;
        let (kind, _) = parse_manual_name(name)
            .ok_or_else(|| StoreError::invalid_backup_name(name, "not a manual backup name"))?;
        Ok((kind, self.manual_dir.join(name)))
    }

    /// Decrypted payload of an automatic snapshot (still schema-wrapped).
    pub fn read_auto(&self, name: &str) -> StoreResult<(Document, Value)> {
        let (document, path) = self.auto_backup_path(name)?;
        let text = read_backup_text(name, &path)?;
        let payload = self.cipher.open(&text).map_err(|e| StoreError::UnreadableBackup {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok((document, payload))
    }

    /// Content of a manual snapshot, whichever format it was written in.
    pub fn read_manual(&self, name: &str) -> StoreResult<(ManualKind, Value)> {
        let (kind, path) = self.manual_backup_path(name)?;
        let text = read_backup_text(name, &path)?;

        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            return Ok((kind, value));
        }
        let value = self.cipher.open(&text).map_err(|e| StoreError::UnreadableBackup {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok((kind, value))
    }

    /// Both directories, newest first.
    pub fn list(&self) -> StoreResult<BackupListing> {
        BackupListing::scan(&self.auto_dir, &self.manual_dir)
    }

    pub fn stats(&self) -> StoreResult<BackupStats> {
        Ok(self.list()?.stats())
    }
}

impl BackupListing {
    /// Read both backup directories without decrypting anything, so it
    /// works without the key.
    pub fn scan(auto_dir: &Path, manual_dir: &Path) -> StoreResult<Self> {
        let mut auto = files::list_files(auto_dir, |n| n.ends_with(AUTO_SUFFIX))
            .map_err(|e| StoreError::io("list auto-backups", auto_dir, e))?;
        files::sort_newest_first(&mut auto);

        let mut manual = files::list_files(manual_dir, is_manual_backup)
            .map_err(|e| StoreError::io("list manual backups", manual_dir, e))?;
        files::sort_newest_first(&mut manual);

        Ok(Self {
            auto: auto.into_iter().map(auto_entry).collect(),
            manual: manual.into_iter().filter_map(manual_entry).collect(),
        })
    }

    pub fn stats(&self) -> BackupStats {
        let mut stats = BackupStats::default();

        for entry in &self.auto {
            stats.auto_backups.total += 1;
            stats.auto_backups.total_size += entry.size;
            let key = entry.document.map_or("unknown", Document::key);
            *stats.auto_backups.per_document.entry(key.to_string()).or_default() += 1;
        }
        for entry in &self.manual {
            stats.manual_backups.total += 1;
            stats.manual_backups.total_size += entry.size;
        }

        let times = self
            .auto
            .iter()
            .map(|e| e.modified)
            .chain(self.manual.iter().map(|e| e.modified));
        for modified in times {
            if stats.oldest_backup.map_or(true, |t| modified < t) {
                stats.oldest_backup = Some(modified);
            }
            if stats.newest_backup.map_or(true, |t| modified > t) {
                stats.newest_backup = Some(modified);
            }
        }
        stats
    }
}

fn read_backup_text(name: &str, path: &Path) -> StoreResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::BackupNotFound(name.to_string()),
        _ => StoreError::io("read backup", path, e),
    })
}

/// Pick `<dir>/<make(ts)>` for the current time, nudging the timestamp
/// forward a millisecond at a time until the name is free.
fn unique_name<F>(dir: &Path, make: F) -> (String, PathBuf)
where
    F: Fn(&str) -> String,
{
    let mut at = Utc::now();
    loop {
        let name = make(&file_timestamp(at));
        let path = dir.join(&name);
        if !path.exists() {
            return (name, path);
        }
        at += Duration::milliseconds(1);
    }
}

fn rotate<F>(dir: &Path, matches: F, keep: usize) -> std::io::Result<usize>
where
    F: Fn(&str) -> bool,
{
    let mut files = files::list_files(dir, matches)?;
    if files.len() <= keep {
        return Ok(0);
    }
    files::sort_newest_first(&mut files);

    let mut removed = 0;
    for stale in &files[keep..] {
        fs::remove_file(&stale.path)?;
        removed += 1;
    }
    Ok(removed)
}

fn auto_entry(info: DirEntryInfo) -> AutoBackupEntry {
    let (document, timestamp) = match parse_auto_name(&info.name) {
        Some((stem, ts)) => (Document::from_file_stem(stem), ts.to_string()),
        None => (None, String::new()),
    };
    AutoBackupEntry {
        document,
        timestamp,
        size: info.size,
        modified: info.modified.into(),
        name: info.name,
    }
}

fn manual_entry(info: DirEntryInfo) -> Option<ManualBackupEntry> {
    let (kind, timestamp) = parse_manual_name(&info.name)?;
    let timestamp = timestamp.to_string();
    Some(ManualBackupEntry {
        kind,
        timestamp,
        size: info.size,
        modified: info.modified.into(),
        name: info.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use haven_crypto::{Algorithm, Passphrase};
    use serde_json::json;
    use tempfile::TempDir;

    fn manager(dir: &TempDir, retention: RetentionPolicy, format: ManualBackupFormat) -> BackupManager {
        let mut config = StoreConfig::new(dir.path());
        config.retention = retention;
        config.manual_backup_format = format;
        let cipher = Cipher::new(&Passphrase::new("backup-tests").unwrap(), Algorithm::Aes256Gcm);
        let manager = BackupManager::new(&config, Arc::new(cipher));
        manager.ensure_dirs().unwrap();
        manager
    }

    fn default_manager(dir: &TempDir) -> BackupManager {
        manager(dir, RetentionPolicy::default(), ManualBackupFormat::Encrypted)
    }

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap() + Duration::milliseconds(123);
        assert_eq!(file_timestamp(at), "2024-05-01T09-30-00-123Z");
    }

    #[test]
    fn test_parse_auto_names() {
        assert_eq!(
            parse_auto_name("bookings_2024-05-01T09-30-00-123Z.enc"),
            Some(("bookings", "2024-05-01T09-30-00-123Z"))
        );
        assert_eq!(
            parse_auto_name("magic_links_2024-05-01T09-30-00-123Z.enc"),
            Some(("magic_links", "2024-05-01T09-30-00-123Z"))
        );
        assert_eq!(parse_auto_name("bookings.enc"), None);
        assert_eq!(parse_auto_name("bookings_2024.json"), None);
    }

    #[test]
    fn test_parse_manual_names() {
        assert_eq!(
            parse_manual_name("backup-2024-05-01T09-30-00-123Z.json"),
            Some((ManualKind::Full, "2024-05-01T09-30-00-123Z"))
        );
        assert_eq!(
            parse_manual_name("backup-before-restore-client_sessions-2024-05-01T09-30-00-123Z.json"),
            Some((ManualKind::BeforeRestore(Document::ClientSessions), "2024-05-01T09-30-00-123Z"))
        );
        assert_eq!(parse_manual_name("notes.json"), None);
        assert_eq!(parse_manual_name("backup-.json"), None);
    }

    #[test]
    fn test_auto_prefix_matching_is_exact() {
        assert!(is_auto_backup_of("clients_2024-01-01T00-00-00-000Z.enc", Document::Clients));
        assert!(!is_auto_backup_of("client_sessions_2024-01-01T00-00-00-000Z.enc", Document::Clients));
        assert!(!is_auto_backup_of("clients_2024-01-01T00-00-00-000Z.enc.tmp", Document::Clients));
    }

    #[test]
    fn test_auto_backup_is_encrypted_and_named() {
        let dir = TempDir::new().unwrap();
        let manager = default_manager(&dir);

        let name = manager
            .create_auto_backup(Document::Bookings, &json!([{"id": "b1"}]))
            .unwrap();
        assert!(name.starts_with("bookings_") && name.ends_with(".enc"));

        let raw = fs::read_to_string(manager.auto_dir().join(&name)).unwrap();
        assert!(!raw.contains("b1"));

        let (document, payload) = manager.read_auto(&name).unwrap();
        assert_eq!(document, Document::Bookings);
        assert_eq!(payload, json!([{"id": "b1"}]));
    }

    #[test]
    fn test_rapid_backups_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let manager = default_manager(&dir);

        let names: std::collections::HashSet<_> = (0..20)
            .map(|i| manager.create_auto_backup(Document::Settings, &json!({"n": i})).unwrap())
            .collect();
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn test_auto_rotation_keeps_newest_per_document() {
        let dir = TempDir::new().unwrap();
        let retention = RetentionPolicy {
            max_auto_backups: 3,
            max_manual_backups: 20,
        };
        let manager = manager(&dir, retention, ManualBackupFormat::Encrypted);

        let mut written = Vec::new();
        for i in 0..5 {
            written.push(manager.create_auto_backup(Document::Clients, &json!([i])).unwrap());
        }
        manager.create_auto_backup(Document::ClientSessions, &json!({})).unwrap();

        let listing = manager.list().unwrap();
        let mut clients: Vec<_> = listing
            .auto
            .iter()
            .filter(|e| e.document == Some(Document::Clients))
            .map(|e| e.name.clone())
            .collect();
        clients.sort();
        assert_eq!(clients, written[2..].to_vec());

        // other documents are untouched by rotation
        assert_eq!(
            listing.auto.iter().filter(|e| e.document == Some(Document::ClientSessions)).count(),
            1
        );
    }

    #[test]
    fn test_manual_rotation() {
        let dir = TempDir::new().unwrap();
        let retention = RetentionPolicy {
            max_auto_backups: 50,
            max_manual_backups: 2,
        };
        let manager = manager(&dir, retention, ManualBackupFormat::Plaintext);

        let first = manager.write_manual(ManualKind::Full, &json!({"n": 1})).unwrap();
        let second = manager.write_manual(ManualKind::Full, &json!({"n": 2})).unwrap();
        let third = manager
            .write_manual(ManualKind::BeforeRestore(Document::Bookings), &json!([]))
            .unwrap();

        let names: Vec<_> = manager.list().unwrap().manual.into_iter().map(|e| e.name).collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&first));
        assert!(names.contains(&second));
        assert!(names.contains(&third));
    }

    #[test]
    fn test_manual_formats_are_both_readable() {
        let dir = TempDir::new().unwrap();
        let plain = manager(&dir, RetentionPolicy::default(), ManualBackupFormat::Plaintext);
        let name = plain.write_manual(ManualKind::Full, &json!({"bookings": []})).unwrap();
        let raw = fs::read_to_string(plain.manual_dir().join(&name)).unwrap();
        assert!(raw.contains("\"bookings\""));

        let encrypted = default_manager(&dir);
        let sealed = encrypted.write_manual(ManualKind::Full, &json!({"clients": [1]})).unwrap();
        let raw = fs::read_to_string(encrypted.manual_dir().join(&sealed)).unwrap();
        assert!(!raw.contains("clients"));

        assert_eq!(encrypted.read_manual(&name).unwrap().1, json!({"bookings": []}));
        assert_eq!(encrypted.read_manual(&sealed).unwrap().1, json!({"clients": [1]}));
    }

    #[test]
    fn test_listing_metadata_and_order() {
        let dir = TempDir::new().unwrap();
        let manager = default_manager(&dir);

        manager.create_auto_backup(Document::Bookings, &json!([])).unwrap();
        let newest = manager.create_auto_backup(Document::MagicLinks, &json!({})).unwrap();
        manager
            .write_manual(ManualKind::BeforeRestore(Document::Settings), &json!({}))
            .unwrap();
        fs::write(manager.manual_dir().join("README.txt"), "ignored").unwrap();

        let listing = manager.list().unwrap();
        assert_eq!(listing.auto.len(), 2);
        assert_eq!(listing.auto[0].name, newest);
        assert_eq!(listing.auto[0].document, Some(Document::MagicLinks));
        assert!(listing.auto[0].size > 0);
        assert_eq!(listing.manual.len(), 1);
        assert_eq!(listing.manual[0].kind, ManualKind::BeforeRestore(Document::Settings));
    }

    #[test]
    fn test_listing_does_not_need_the_key() {
        let dir = TempDir::new().unwrap();
        default_manager(&dir)
            .create_auto_backup(Document::Leads, &json!([]))
            .unwrap();

        let config = StoreConfig::new(dir.path());
        let listing = BackupListing::scan(&config.auto_backup_dir(), &config.manual_backup_dir()).unwrap();
        assert_eq!(listing.auto.len(), 1);
        assert_eq!(listing.auto[0].document, Some(Document::Leads));
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let manager = default_manager(&dir);
        manager.create_auto_backup(Document::Bookings, &json!([])).unwrap();
        manager.create_auto_backup(Document::Bookings, &json!([1])).unwrap();
        manager.create_auto_backup(Document::Content, &json!({})).unwrap();
        manager.write_manual(ManualKind::Full, &json!({})).unwrap();

        let stats = manager.stats().unwrap();
        assert_eq!(stats.auto_backups.total, 3);
        assert_eq!(stats.auto_backups.per_document.get("bookings"), Some(&2));
        assert_eq!(stats.auto_backups.per_document.get("content"), Some(&1));
        assert_eq!(stats.manual_backups.total, 1);
        assert!(stats.oldest_backup.unwrap() <= stats.newest_backup.unwrap());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let manager = default_manager(&dir);

        for name in ["../bookings.enc", "auto/bookings_x.enc", "..", ""] {
            assert!(matches!(
                manager.read_auto(name),
                Err(StoreError::InvalidBackupName { .. })
            ));
        }
        assert!(matches!(
            manager.read_auto("payments_2024-01-01T00-00-00-000Z.enc"),
            Err(StoreError::InvalidBackupName { .. })
        ));
        assert!(matches!(
            manager.read_auto("bookings_2024-01-01T00-00-00-000Z.enc"),
            Err(StoreError::BackupNotFound(_))
        ));
    }

    #[test]
    fn test_failed_snapshot_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let manager = default_manager(&dir);
        fs::remove_dir_all(manager.auto_dir()).unwrap();
        fs::write(manager.auto_dir(), "not a directory").unwrap();

        assert!(manager.create_auto_backup(Document::Bookings, &json!([])).is_none());
        assert_eq!(manager.rotate_auto_backups(Document::Bookings), 0);
    }
}
