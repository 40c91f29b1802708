//! Domain types shared by the stores, the upstream client and the REST layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Credentials
// =============================================================================

/// End-user credentials forwarded to the upstream login endpoint.
///
/// `email` doubles as the local user identity for the session cache.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamCredentials {
    pub email: String,
    pub password: String,
}

impl UpstreamCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The local user identity used as the session cache key.
    pub fn user_id(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for UpstreamCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Session Cache
// =============================================================================

/// A cached upstream bearer credential.
///
/// At most one exists per (`user_id`, `service_id`) pair. There is no expiry;
/// staleness is discovered when the upstream rejects the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: String,
    pub service_id: String,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user_id", &self.user_id)
            .field("service_id", &self.service_id)
            .field("token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

// =============================================================================
// Documents
// =============================================================================

/// The upstream service's document representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    pub title: String,
}

/// An upstream document translated to the internal shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedDocument {
    pub ref_key: String,
    pub title: String,
}

impl ImportedDocument {
    pub fn new(ref_key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            ref_key: ref_key.into(),
            title: title.into(),
        }
    }
}

impl From<RemoteDocument> for ImportedDocument {
    fn from(doc: RemoteDocument) -> Self {
        Self {
            ref_key: doc.id,
            title: doc.title,
        }
    }
}

impl From<ImportedDocument> for RemoteDocument {
    fn from(doc: ImportedDocument) -> Self {
        Self {
            id: doc.ref_key,
            title: doc.title,
        }
    }
}

/// Local copy of an upstream document.
///
/// `id` is the local primary key; `ref_key` is the upstream identifier and is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredDocument {
    pub id: Uuid,
    pub ref_key: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Outcome of a bulk import.
///
/// `skipped` is always `requested - count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub count: u64,
    pub skipped: u64,
}

impl ImportSummary {
    /// Builds a summary from the number of requested and inserted rows.
    #[must_use]
    pub fn from_counts(requested: usize, inserted: u64) -> Self {
        let requested = requested as u64;
        Self {
            count: inserted,
            skipped: requested.saturating_sub(inserted),
        }
    }
}

/// Body of a forwarded create/update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRemoteDocument {
    pub title: String,
}

impl EditRemoteDocument {
    /// Rejects blank titles.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        Ok(())
    }
}
