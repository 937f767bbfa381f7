//! Per-document locks for load-mutate-save cycles
//!
//! In-process only. Two processes pointed at the same data directory are
//! not coordinated.

use std::sync::{Mutex, MutexGuard};

use crate::document::Document;

pub struct DocumentLocks {
    locks: Vec<Mutex<()>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self {
            locks: Document::ALL.iter().map(|_| Mutex::new(())).collect(),
        }
    }

    /// Block until `document` is free. Released when the guard drops.
    pub fn acquire(&self, document: Document) -> DocumentGuard<'_> {
        let guard = match self.locks[document.index()].lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // the data lives on disk; a panic mid-update leaves nothing to repair here
                tracing::warn!(%document, "document lock was poisoned; continuing");
                poisoned.into_inner()
            }
        };
        DocumentGuard {
            document,
            _guard: guard,
        }
    }
}

impl Default for DocumentLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[must_use = "the document is unlocked as soon as the guard is dropped"]
pub struct DocumentGuard<'a> {
    document: Document,
    _guard: MutexGuard<'a, ()>,
}

impl DocumentGuard<'_> {
    pub fn document(&self) -> Document {
        self.document
    }
}
