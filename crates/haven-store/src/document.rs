//! Registry of the documents the application persists
//!
//! Each document has two spellings: the camelCase key used inside
//! composite backups and the snake_case stem used for file names.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Document {
    Bookings,
    Clients,
    Settings,
    Content,
    Inquiries,
    Campaigns,
    Segments,
    Workflows,
    Templates,
    Leads,
    LeadMagnets,
    DripCampaigns,
    Messages,
    DiscoveryCalls,
    MagicLinks,
    ClientSessions,
    InvitationCodes,
}

impl Document {
    pub const ALL: [Document; 17] = [
        Document::Bookings,
        Document::Clients,
        Document::Settings,
        Document::Content,
        Document::Inquiries,
        Document::Campaigns,
        Document::Segments,
        Document::Workflows,
        Document::Templates,
        Document::Leads,
        Document::LeadMagnets,
        Document::DripCampaigns,
        Document::Messages,
        Document::DiscoveryCalls,
        Document::MagicLinks,
        Document::ClientSessions,
        Document::InvitationCodes,
    ];

    /// Key inside composite backups.
    pub fn key(self) -> &'static str {
        match self {
            Document::Bookings => "bookings",
            Document::Clients => "clients",
            Document::Settings => "settings",
            Document::Content => "content",
            Document::Inquiries => "inquiries",
            Document::Campaigns => "campaigns",
            Document::Segments => "segments",
            Document::Workflows => "workflows",
            Document::Templates => "templates",
            Document::Leads => "leads",
            Document::LeadMagnets => "leadMagnets",
            Document::DripCampaigns => "dripCampaigns",
            Document::Messages => "messages",
            Document::DiscoveryCalls => "discoveryCalls",
            Document::MagicLinks => "magicLinks",
            Document::ClientSessions => "clientSessions",
            Document::InvitationCodes => "invitationCodes",
        }
    }

    /// File name stem, e.g. `magic_links` for `magic_links.enc`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Document::LeadMagnets => "lead_magnets",
            Document::DripCampaigns => "drip_campaigns",
            Document::DiscoveryCalls => "discovery_calls",
            Document::MagicLinks => "magic_links",
            Document::ClientSessions => "client_sessions",
            Document::InvitationCodes => "invitation_codes",
            other => other.key(),
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.enc", self.file_stem())
    }

    pub fn from_file_stem(stem: &str) -> Option<Document> {
        Self::ALL.into_iter().find(|d| d.file_stem() == stem)
    }

    pub fn from_key(key: &str) -> Option<Document> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }

    /// Keyed maps (token -> record) rather than lists of records.
    pub fn is_map(self) -> bool {
        matches!(self, Document::MagicLinks | Document::ClientSessions)
    }

    pub fn is_list(self) -> bool {
        !self.is_map() && !matches!(self, Document::Settings | Document::Content)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Value returned when the document has never been saved or cannot be read.
    pub fn default_value(self) -> Value {
        match self {
            Document::Settings => default_settings(),
            Document::Content => default_content(),
            d if d.is_map() => json!({}),
            _ => json!([]),
        }
    }
}

fn default_settings() -> Value {
    json!({
        "availableDays": ["monday", "tuesday", "wednesday", "thursday", "friday"],
        "availableSlots": ["9:00 AM", "10:30 AM", "12:00 PM", "2:00 PM", "4:00 PM", "6:00 PM"],
        "blockedDates": [],
        "services": [],
        "emailNotifications": true,
        "autoConfirmationEmail": true,
        "reminderEmails": true,
        "reminderHours": 24
    })
}

fn default_content() -> Value {
    json!({
        "testimonials": [],
        "faqs": [],
        "siteSettings": {
            "siteName": "",
            "tagline": "",
            "email": "",
            "location": "",
            "maintenanceMode": false
        }
    })
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Document {
    type Err = StoreError;

    /// Accepts `invitationCodes` as well as `invitation_codes`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
            .or_else(|| Self::from_file_stem(s))
            .ok_or_else(|| StoreError::UnknownDocument(s.to_string()))
    }
}
