use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity Schemas (owned by the BaaS, read-only here) ---

/// Session
///
/// An opaque credential representing an authenticated actor. Created on the
/// OAuth callback, carried by the session cookie, destroyed on logout or
/// expiry. The BaaS owns its lifecycle; this service only references it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    /// The cookie-carried secret. Never logged.
    pub secret: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,
}

/// Account
///
/// The caller's canonical identity record as returned by the identity
/// collaborator. Role strings are stored separately, in a role-assignment
/// collection keyed by this account's id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// UserProfile
///
/// Output schema for GET /me: the resolved account plus the role set fetched
/// from the row store. Richer than the internal `Account`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
}

// --- Content Schemas ---

/// ContentStatus
///
/// Closed set of publication states for content entries. Public listings only
/// ever surface `Published`; the admin surface sees all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContentStatus {
    Published,
    #[default]
    Draft,
    Archived,
}

/// BadgeStyle
///
/// Visual style tag the frontends map onto badge components. The mapping from
/// status to style is a closed, exhaustive function of `ContentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BadgeStyle {
    Success,
    Warning,
    Neutral,
}

impl ContentStatus {
    /// badge_style
    ///
    /// Exhaustive status-to-style mapping. Adding a status variant forces this
    /// match to be extended.
    pub fn badge_style(self) -> BadgeStyle {
        match self {
            ContentStatus::Published => BadgeStyle::Success,
            ContentStatus::Draft => BadgeStyle::Warning,
            ContentStatus::Archived => BadgeStyle::Neutral,
        }
    }
}

/// ContentTranslation
///
/// A locale-specific variant of a content entry's text fields. Stored as its
/// own row with a locale tag and a back-reference to the parent entry. At most
/// one translation per (entry, locale) pair is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentTranslation {
    /// Row id. Some upstream rows arrive without one; the resolver then
    /// synthesizes a stable key from the parent id and locale.
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Back-reference to the parent content entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    pub locale: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// ContentEntry
///
/// The language-neutral row for a piece of content (news, event, job):
/// status, campus, dates, and media references, plus zero or more embedded
/// translation rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentEntry {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus_id: Option<String>,
    #[ts(type = "string | null")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// File id in the media bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub translations: Vec<ContentTranslation>,
}

/// ContentView
///
/// Ephemeral per-request merge of a content entry and its chosen translation.
/// Produced fresh on every render, never persisted, never shared across
/// requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentView {
    /// Stable rendering key: the translation row id, or `"{entry_id}-{locale}"`
    /// when the row arrived without one.
    pub id: String,
    pub content_id: String,
    pub locale: String,
    pub title: String,
    pub body: String,
    pub status: ContentStatus,
    pub badge: BadgeStyle,
    pub campus_id: Option<String>,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
    pub cover_image: Option<String>,
}

impl Default for BadgeStyle {
    fn default() -> Self {
        ContentStatus::default().badge_style()
    }
}

/// Campus
///
/// A membership campus row. The national campus is the lookup target of the
/// membership endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Campus {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
}

/// Feed
///
/// Output schema for the home feed: the three content collections fetched
/// concurrently and merged after all complete.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Feed {
    pub news: Vec<ContentView>,
    pub events: Vec<ContentView>,
    pub jobs: Vec<ContentView>,
}

// --- Request Payloads (Input Schemas) ---

/// AnalyticsBeacon
///
/// Input payload for the fire-and-forget analytics endpoint. Persisted as a
/// row in the analytics collection; failures are logged and swallowed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyticsBeacon {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// UpdateStatusRequest
///
/// Admin payload for changing a content entry's publication status.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStatusRequest {
    pub status: ContentStatus,
}

// --- Action Results (Output Schemas) ---

/// UploadResponse
///
/// Structured `{success, error}` result for the upload action. Call sites on
/// the frontend branch on `success` rather than on HTTP status alone.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

/// StoredFile
///
/// Minimal record of a file created in the media bucket.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
}

// --- Schema Passthrough ---

/// SchemaAttribute
///
/// One attribute of a collection schema, as reported by the row store.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SchemaAttribute {
    pub key: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub array: bool,
}

/// CollectionSchema
///
/// Output schema for the schema-by-collection endpoint, consumed by the admin
/// app's dynamic form builder.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CollectionSchema {
    pub collection: String,
    pub attributes: Vec<SchemaAttribute>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_mapping_is_exhaustive_and_fixed() {
        assert_eq!(ContentStatus::Published.badge_style(), BadgeStyle::Success);
        assert_eq!(ContentStatus::Draft.badge_style(), BadgeStyle::Warning);
        assert_eq!(ContentStatus::Archived.badge_style(), BadgeStyle::Neutral);
    }

    #[test]
    fn content_entry_deserializes_baas_row() {
        let raw = serde_json::json!({
            "$id": "n1",
            "status": "published",
            "campus_id": "5",
            "translations": [
                { "$id": "t1", "content_id": "n1", "locale": "en", "title": "Hello", "body": "..." }
            ]
        });
        let entry: ContentEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.id, "n1");
        assert_eq!(entry.status, ContentStatus::Published);
        assert_eq!(entry.translations.len(), 1);
        assert_eq!(entry.translations[0].locale, "en");
    }

    #[test]
    fn translation_without_id_deserializes() {
        let raw = serde_json::json!({ "locale": "fi", "title": "Moi" });
        let t: ContentTranslation = serde_json::from_value(raw).unwrap();
        assert!(t.id.is_none());
        assert!(t.content_id.is_none());
        assert_eq!(t.body, "");
    }
}
