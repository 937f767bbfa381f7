//! Haven Store - encrypted file-backed documents with automatic backups
//!
//! One JSON document per logical collection (bookings, clients, settings, ...),
//! each sealed into `<data_dir>/<name>.enc`. Every save also writes a
//! timestamped snapshot to `backups/auto/`, rotated to a fixed retention.
//! Operators can take full-set manual backups and restore from either kind.

pub mod backup;
pub mod config;
pub mod document;
pub mod error;
mod files;
pub mod lock;
pub mod repos;
pub mod restore;
pub mod schema;
pub mod store;

pub use backup::{AutoBackupEntry, BackupListing, BackupManager, BackupStats, ManualBackupEntry, ManualKind};
pub use config::{ManualBackupFormat, ReadPolicy, RetentionPolicy, StoreConfig};
pub use document::Document;
pub use error::{StoreError, StoreResult};
pub use lock::DocumentGuard;
pub use repos::Repository;
pub use restore::RestoreReport;
pub use schema::SchemaMigrator;
pub use store::{DocumentStatus, DocumentStore, ReadOutcome};
