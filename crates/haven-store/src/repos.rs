//! Per-document repositories
//!
//! Thin handles over [`DocumentStore`] for the record lists the application
//! keeps (bookings, clients, leads, ...). Records are JSON objects matched by
//! their `id` field.

use serde_json::Value;
use uuid::Uuid;

use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy)]
pub struct Repository<'a> {
    store: &'a DocumentStore,
    document: Document,
}

impl<'a> Repository<'a> {
    pub fn new(store: &'a DocumentStore, document: Document) -> Self {
        Self { store, document }
    }

    pub fn document(&self) -> Document {
        self.document
    }

    pub fn load(&self) -> StoreResult<Value> {
        self.store.load_value(self.document)
    }

    pub fn save(&self, value: &Value) -> StoreResult<()> {
        self.store.save(self.document, value)
    }

    pub fn update<F, R>(&self, mutate: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Value) -> R,
    {
        self.store
            .update(self.document, self.document.default_value(), mutate)
    }

    pub fn find(&self, id: &str) -> StoreResult<Option<Value>> {
        self.ensure_list()?;
        let records = self.load()?;
        let records = records
            .as_array()
            .ok_or(StoreError::NotAList { document: self.document })?;
        Ok(records.iter().find(|r| record_id(r).as_deref() == Some(id)).cloned())
    }

    /// Replace the record with the same `id`, or append it. Records without
    /// an `id` get a fresh UUID. Returns the id.
    pub fn upsert(&self, mut record: Value) -> StoreResult<String> {
        self.ensure_list()?;
        let document = self.document;
        let fields = record.as_object_mut().ok_or(StoreError::InvalidRecord {
            document,
            reason: "records must be JSON objects",
        })?;
        let id = match record_id_field(fields.get("id")) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                fields.insert("id".into(), Value::String(id.clone()));
                id
            }
        };

        self.update(|records| -> StoreResult<()> {
            let records = records.as_array_mut().ok_or(StoreError::NotAList { document })?;
            match records.iter_mut().find(|r| record_id(r).as_deref() == Some(id.as_str())) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
            Ok(())
        })??;

        tracing::debug!(%document, id = %id, "record upserted");
        Ok(id)
    }

    /// Remove the record with `id`. Returns whether one was found.
    pub fn remove(&self, id: &str) -> StoreResult<bool> {
        self.ensure_list()?;
        let document = self.document;
        self.update(|records| -> StoreResult<bool> {
            let records = records.as_array_mut().ok_or(StoreError::NotAList { document })?;
            let before = records.len();
            records.retain(|r| record_id(r).as_deref() != Some(id));
            Ok(records.len() != before)
        })?
    }

    fn ensure_list(&self) -> StoreResult<()> {
        if self.document.is_list() {
            Ok(())
        } else {
            Err(StoreError::NotAList { document: self.document })
        }
    }
}

fn record_id(record: &Value) -> Option<String> {
    record_id_field(record.get("id"))
}

fn record_id_field(id: Option<&Value>) -> Option<String> {
    match id? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

macro_rules! repositories {
    ($($name:ident => $document:ident),* $(,)?) => {
        impl DocumentStore {
            pub fn repository(&self, document: Document) -> Repository<'_> {
                Repository::new(self, document)
            }

            $(
                pub fn $name(&self) -> Repository<'_> {
                    self.repository(Document::$document)
                }
            )*
        }
    };
}

repositories! {
    bookings => Bookings,
    clients => Clients,
    settings => Settings,
    content => Content,
    inquiries => Inquiries,
    campaigns => Campaigns,
    segments => Segments,
    workflows => Workflows,
    templates => Templates,
    leads => Leads,
    lead_magnets => LeadMagnets,
    drip_campaigns => DripCampaigns,
    messages => Messages,
    discovery_calls => DiscoveryCalls,
    magic_links => MagicLinks,
    client_sessions => ClientSessions,
    invitation_codes => InvitationCodes,
}
