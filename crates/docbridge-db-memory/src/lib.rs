//! In-memory storage backend for docbridge.
//!
//! Provides [`SessionStore`](docbridge_core::SessionStore) and
//! [`MirrorStore`](docbridge_core::MirrorStore) implementations backed by
//! `dashmap`. Uniqueness is enforced through the map's entry API, so the
//! same conflict semantics hold as with the PostgreSQL backend.
//!
//! # Example
//!
//! ```ignore
//! use docbridge_db_memory::MemorySessionStore;
//! use docbridge_core::SessionStore;
//!
//! let sessions = MemorySessionStore::new();
//! sessions.create("jane@example.com", "http://upstream", "token").await?;
//! ```

mod mirror;
mod session;

pub use mirror::MemoryMirrorStore;
pub use session::MemorySessionStore;

use std::sync::Arc;

use docbridge_core::{DynMirrorStore, DynSessionStore};

/// Creates a shareable in-memory session store.
pub fn create_session_store() -> DynSessionStore {
    Arc::new(MemorySessionStore::new())
}

/// Creates a shareable in-memory mirror store.
pub fn create_mirror_store() -> DynMirrorStore {
    Arc::new(MemoryMirrorStore::new())
}
