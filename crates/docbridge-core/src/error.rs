//! Error types for storage backends and the upstream proxy.
//!
//! Two layers are kept apart:
//!
//! - [`StorageError`] is what a [`SessionStore`](crate::SessionStore) or
//!   [`MirrorStore`](crate::MirrorStore) reports.
//! - [`SyncError`] is what the upstream client and the reconciler report to
//!   their callers. A `Conflict` never leaves the cache/mirror layer; it is
//!   recovered there and turned into a log line or a `None` result.

/// Boxed error used to carry the original cause of an upstream failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record already exists (unique constraint violation).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl StorageError {
    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a `Database` error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// =============================================================================
// Sync Errors
// =============================================================================

/// Errors surfaced by the upstream client and the sync reconciler.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Missing local or remote resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, invalid or stale credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Duplicate key. Recovered at the cache/mirror layer.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any unexpected upstream failure.
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        /// What was being attempted.
        message: String,
        /// The original cause.
        #[source]
        source: BoxError,
    },

    /// Malformed inbound input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Local store failure that is not a conflict.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a `BadRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an `UpstreamUnavailable` error wrapping its cause.
    #[must_use]
    pub fn upstream_unavailable(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is an `Unauthorized` error.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Returns `true` if this is an `UpstreamUnavailable` error.
    #[must_use]
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }

    /// Returns `true` if this is a `BadRequest` error.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}

impl From<StorageError> for SyncError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => Self::NotFound(msg),
            StorageError::Conflict(msg) => Self::Conflict(msg),
            StorageError::Database(msg) => Self::Internal(msg),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
