//! Error types for the document store
//!
//! Degraded reads (missing file, wrong key, corruption) only surface here
//! when the store runs with `ReadPolicy::Escalate`; otherwise they fall
//! back to the document's default value.

use std::path::PathBuf;
use thiserror::Error;

use crate::document::Document;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O operation failed: {operation} ({})", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not encrypt {document}; nothing was written")]
    Encryption { document: Document },

    #[error("{document} is corrupted: {reason}")]
    Corrupted { document: Document, reason: String },

    #[error("{document} could not be authenticated (wrong key or tampered file)")]
    KeyMismatch { document: Document },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document} does not hold a list")]
    NotAList { document: Document },

    #[error("Invalid {document} record: {reason}")]
    InvalidRecord { document: Document, reason: &'static str },

    #[error("Invalid backup name {name:?}: {reason}")]
    InvalidBackupName { name: String, reason: &'static str },

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Unreadable backup {name}: {reason}")]
    UnreadableBackup { name: String, reason: String },

    #[error("Could not encrypt backup: {0}")]
    BackupEncryption(String),

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Unsupported schema version {found} for {document} (newest known is {supported})")]
    SchemaTooNew {
        document: Document,
        found: u64,
        supported: u32,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn corrupted(document: Document, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            document,
            reason: reason.into(),
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_backup_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidBackupName {
            name: name.into(),
            reason,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::corrupted(Document::Bookings, "bad shape");
        assert_eq!(err.to_string(), "bookings is corrupted: bad shape");

        let err = StoreError::KeyMismatch { document: Document::InvitationCodes };
        assert!(err.to_string().starts_with("invitationCodes could not be authenticated"));
    }

    #[test]
    fn test_io_error_chaining() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::io("write document", "/data/bookings.enc", io_err);

        assert!(err.source().is_some());
        assert!(err.to_string().contains("/data/bookings.enc"));
    }
}
