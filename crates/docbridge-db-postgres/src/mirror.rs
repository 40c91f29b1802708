//! `MirrorStore` backed by the `document` table.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use uuid::Uuid;

use docbridge_core::{
    ImportedDocument, MirrorStore, MirroredDocument, StorageError, StorageResult,
};

use crate::PgPool;
use crate::error::map_sqlx;

type DocumentTuple = (Uuid, String, String, OffsetDateTime);

const INSERT_DOCUMENT: &str = r#"
    INSERT INTO document (id, ref_key, title, created_at)
    VALUES ($1, $2, $3, NOW())
    RETURNING id, ref_key, title, created_at
"#;

/// Rows whose `ref_key` already exists, in the table or earlier in the
/// batch, are skipped.
const INSERT_DOCUMENTS_SKIP_EXISTING: &str = r#"
    INSERT INTO document (id, ref_key, title, created_at)
    SELECT id, ref_key, title, NOW()
    FROM UNNEST($1::uuid[], $2::text[], $3::text[]) AS t(id, ref_key, title)
    ON CONFLICT (ref_key) DO NOTHING
"#;

const SELECT_DOCUMENT: &str = r#"
    SELECT id, ref_key, title, created_at
    FROM document
    WHERE ref_key = $1
"#;

const COUNT_DOCUMENTS: &str = "SELECT COUNT(*) FROM document";

fn from_tuple(row: DocumentTuple) -> MirroredDocument {
    MirroredDocument {
        id: row.0,
        ref_key: row.1,
        title: row.2,
        created_at: row.3,
    }
}

#[derive(Debug, Clone)]
pub struct PostgresMirrorStore {
    pool: PgPool,
}

impl PostgresMirrorStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MirrorStore for PostgresMirrorStore {
    async fn create(&self, ref_key: &str, title: &str) -> StorageResult<MirroredDocument> {
        let row: DocumentTuple = query_as(INSERT_DOCUMENT)
        .bind(Uuid::new_v4())
        .bind(ref_key)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx(e, || {
                format!("document with ref_key '{ref_key}' already exists")
            })
        })?;

        Ok(from_tuple(row))
    }

    /// Single statement bulk insert.
    async fn create_many(&self, documents: &[ImportedDocument]) -> StorageResult<u64> {
        if documents.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = documents.iter().map(|_| Uuid::new_v4()).collect();
        let ref_keys: Vec<String> = documents.iter().map(|d| d.ref_key.clone()).collect();
        let titles: Vec<String> = documents.iter().map(|d| d.title.clone()).collect();

        let result = query(INSERT_DOCUMENTS_SKIP_EXISTING)
        .bind(&ids)
        .bind(&ref_keys)
        .bind(&titles)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database(e.to_string()))?;

        let inserted = result.rows_affected();
        tracing::debug!(
            requested = documents.len(),
            inserted,
            "Bulk insert into mirror"
        );

        Ok(inserted)
    }

    async fn find_by_ref_key(&self, ref_key: &str) -> StorageResult<Option<MirroredDocument>> {
        let row: Option<DocumentTuple> = query_as(SELECT_DOCUMENT)
        .bind(ref_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::database(e.to_string()))?;

        Ok(row.map(from_tuple))
    }

    async fn count(&self) -> StorageResult<u64> {
        let count: i64 = query_scalar(COUNT_DOCUMENTS)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::database(e.to_string()))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
