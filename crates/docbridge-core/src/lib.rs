//! # docbridge-core
//!
//! Shared building blocks for the docbridge synchronization bridge.
//!
//! This crate defines the types and traits every other layer depends on.
//! It does not contain any storage or network implementations - those are
//! provided by separate crates.
//!
//! ## Overview
//!
//! - [`SessionStore`] - cache of upstream bearer credentials, keyed by
//!   (local user, upstream service)
//! - [`MirrorStore`] - local mirror of upstream documents, deduplicated on `ref_key`
//! - [`SyncError`] - the error taxonomy surfaced by the proxy and reconciler
//! - [`StorageError`] - errors produced by storage backends
//!
//! ## Storage Backends
//!
//! ```ignore
//! use async_trait::async_trait;
//! use docbridge_core::{AuthSession, SessionStore, StorageResult};
//!
//! struct MySessions;
//!
//! #[async_trait]
//! impl SessionStore for MySessions {
//!     async fn get(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession> {
//!         // Implementation
//!     }
//!     // ... other methods
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{BoxError, StorageError, SyncError};
pub use traits::{MirrorStore, SessionStore};
pub use types::{
    AuthSession, EditRemoteDocument, ImportSummary, ImportedDocument, MirroredDocument,
    RemoteDocument, UpstreamCredentials,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a proxy/reconciler result.
pub type SyncResult<T> = Result<T, SyncError>;

/// Shared session store trait object.
pub type DynSessionStore = std::sync::Arc<dyn SessionStore>;

/// Shared mirror store trait object.
pub type DynMirrorStore = std::sync::Arc<dyn MirrorStore>;
