//! Storage traits for the session cache and the local document mirror.
//!
//! # Implementations
//!
//! - `docbridge-db-memory` - in-process maps (tests, single-node dev)
//! - `docbridge-db-postgres` - PostgreSQL

use async_trait::async_trait;

use crate::StorageResult;
use crate::types::{AuthSession, ImportedDocument, MirroredDocument};

/// Persistent cache of upstream bearer credentials.
///
/// Keyed uniquely on (`user_id`, `service_id`). There is no update-in-place:
/// invalidating a token is always delete-then-recreate. Each method is a
/// single atomic operation; no transaction spans two calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Looks up the cached session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no session is cached. Callers treat
    /// this as "credential absent", not as a failure.
    async fn get(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession>;

    /// Caches a new session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the pair already has a session.
    /// Two concurrent logins for the same pair race here; the loser gets the
    /// conflict and must swallow it.
    async fn create(
        &self,
        user_id: &str,
        service_id: &str,
        token: &str,
    ) -> StorageResult<AuthSession>;

    /// Removes the cached session so the next lookup forces a fresh login.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no session is cached.
    async fn delete(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession>;
}

/// Local mirror of upstream documents, unique on `ref_key`.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Inserts a single document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `ref_key` is already mirrored.
    async fn create(&self, ref_key: &str, title: &str) -> StorageResult<MirroredDocument>;

    /// Inserts many documents, skipping any whose `ref_key` already exists
    /// (in the store or earlier in the same batch).
    ///
    /// Returns the number of rows actually inserted.
    async fn create_many(&self, documents: &[ImportedDocument]) -> StorageResult<u64>;

    /// Finds a mirrored document by its upstream identifier.
    async fn find_by_ref_key(&self, ref_key: &str) -> StorageResult<Option<MirroredDocument>>;

    /// Number of mirrored documents.
    async fn count(&self) -> StorageResult<u64>;
}
