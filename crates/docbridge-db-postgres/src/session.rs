//! `SessionStore` backed by the `auth_session` table.

use async_trait::async_trait;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use docbridge_core::{AuthSession, SessionStore, StorageError, StorageResult};

use crate::PgPool;
use crate::error::map_sqlx;

type SessionTuple = (String, String, String, OffsetDateTime);

const SELECT_SESSION: &str = r#"
    SELECT user_id, service_id, token, created_at
    FROM auth_session
    WHERE user_id = $1 AND service_id = $2
"#;

const INSERT_SESSION: &str = r#"
    INSERT INTO auth_session (id, user_id, service_id, token, created_at)
    VALUES ($1, $2, $3, $4, NOW())
    RETURNING user_id, service_id, token, created_at
"#;

const DELETE_SESSION: &str = r#"
    DELETE FROM auth_session
    WHERE user_id = $1 AND service_id = $2
    RETURNING user_id, service_id, token, created_at
"#;

fn from_tuple(row: SessionTuple) -> AuthSession {
    AuthSession {
        user_id: row.0,
        service_id: row.1,
        token: row.2,
        created_at: row.3,
    }
}

fn describe(user_id: &str, service_id: &str) -> String {
    format!("session for user={user_id} service={service_id}")
}

/// PostgreSQL session cache. Uniqueness of (user, service) is enforced by the
/// `auth_session_user_service_key` constraint.
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn get(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession> {
        tracing::debug!(user = %user_id, service = %service_id, "Fetching session");

        let row: Option<SessionTuple> = query_as(SELECT_SESSION)
        .bind(user_id)
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::database(e.to_string()))?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::not_found(describe(user_id, service_id)))
    }

    async fn create(
        &self,
        user_id: &str,
        service_id: &str,
        token: &str,
    ) -> StorageResult<AuthSession> {
        tracing::debug!(user = %user_id, service = %service_id, "Creating a new session");

        let row: SessionTuple = query_as(INSERT_SESSION)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(service_id)
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx(e, || {
                format!("{} already exists", describe(user_id, service_id))
            })
        })?;

        Ok(from_tuple(row))
    }

    async fn delete(&self, user_id: &str, service_id: &str) -> StorageResult<AuthSession> {
        tracing::debug!(user = %user_id, service = %service_id, "Removing session");

        let row: Option<SessionTuple> = query_as(DELETE_SESSION)
        .bind(user_id)
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::database(e.to_string()))?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::not_found(describe(user_id, service_id)))
    }
}
