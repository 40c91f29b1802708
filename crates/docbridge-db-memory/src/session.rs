use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use docbridge_core::{AuthSession, SessionStore, StorageError, StorageResult};
use time::OffsetDateTime;

type SessionKey = (String, String);

fn key(user_id: &str, service_id: &str) -> SessionKey {
    (user_id.to_string(), service_id.to_string())
}

/// In-memory session cache keyed on (user, service).
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionKey, AuthSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession> {
        tracing::debug!(user = %user_id, service = %service_id, "Fetching session");

        self.sessions
            .get(&key(user_id, service_id))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                StorageError::not_found(format!(
                    "session for user={user_id} service={service_id}"
                ))
            })
    }

    async fn create(
        &self,
        user_id: &str,
        service_id: &str,
        token: &str,
    ) -> StorageResult<AuthSession> {
        tracing::debug!(user = %user_id, service = %service_id, "Creating a new session");

        match self.sessions.entry(key(user_id, service_id)) {
            Entry::Occupied(_) => Err(StorageError::conflict(format!(
                "session for user={user_id} service={service_id} already exists"
            ))),
            Entry::Vacant(slot) => {
                let session = AuthSession {
                    user_id: user_id.to_string(),
                    service_id: service_id.to_string(),
                    token: token.to_string(),
                    created_at: OffsetDateTime::now_utc(),
                };
                slot.insert(session.clone());
                Ok(session)
            }
        }
    }

    async fn delete(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession> {
        tracing::debug!(user = %user_id, service = %service_id, "Removing session");

        self.sessions
            .remove(&key(user_id, service_id))
            .map(|(_, session)| session)
            .ok_or_else(|| {
                StorageError::not_found(format!(
                    "session for user={user_id} service={service_id}"
                ))
            })
    }
}
