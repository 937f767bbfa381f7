//! Schema versioning for stored documents
//!
//! Sealed payloads are `{"schemaVersion": N, "data": <document>}`. Payloads
//! without that wrapper were written before versioning existed and count
//! as version 0. Migration step `i` upgrades version `i` to `i + 1`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::{StoreError, StoreResult};

/// Version written by the default migrator
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const VERSION_FIELD: &str = "schemaVersion";
const DATA_FIELD: &str = "data";

pub type Migration = Box<dyn Fn(Document, Value) -> Value + Send + Sync>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioned<'a, T: ?Sized> {
    pub schema_version: u32,
    pub data: &'a T,
}

/// Split a decrypted payload into (stored version, document value).
pub fn split_versioned(payload: Value) -> (u64, Value) {
    match payload {
        Value::Object(mut map) if is_wrapper(&map) => {
            let version = map.get(VERSION_FIELD).and_then(Value::as_u64).unwrap_or(0);
            let data = map.remove(DATA_FIELD).unwrap_or(Value::Null);
            (version, data)
        }
        bare => (0, bare),
    }
}

fn is_wrapper(map: &Map<String, Value>) -> bool {
    map.len() == 2
        && map.get(VERSION_FIELD).map_or(false, Value::is_u64)
        && map.contains_key(DATA_FIELD)
}

pub struct SchemaMigrator {
    steps: Vec<Migration>,
}

impl Default for SchemaMigrator {
    fn default() -> Self {
        // v0 -> v1 only introduced the wrapper; document shapes are unchanged
        Self::empty().with_step(|_, value| value)
    }
}

impl SchemaMigrator {
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn with_step<F>(mut self, step: F) -> Self
    where
        F: Fn(Document, Value) -> Value + Send + Sync + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn current_version(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn wrap<'a, T: ?Sized>(&self, data: &'a T) -> Versioned<'a, T> {
        Versioned {
            schema_version: self.current_version(),
            data,
        }
    }

    /// Bring `value`, stored at version `from`, up to the current version.
    pub fn migrate(&self, document: Document, value: Value, from: u64) -> StoreResult<Value> {
        let current = self.current_version();
        if from > u64::from(current) {
            return Err(StoreError::SchemaTooNew {
                document,
                found: from,
                supported: current,
            });
        }

        let mut value = value;
        for step in &self.steps[from as usize..] {
            value = step(document, value);
        }
        if from < u64::from(current) {
            tracing::debug!(%document, from, to = current, "migrated document schema");
        }
        Ok(value)
    }

    /// Unwrap a decrypted payload and migrate it.
    pub fn upgrade(&self, document: Document, payload: Value) -> StoreResult<(Value, u64)> {
        let (version, data) = split_versioned(payload);
        Ok((self.migrate(document, data, version)?, version))
    }
}
