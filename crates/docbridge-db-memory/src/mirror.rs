use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use docbridge_core::{
    ImportedDocument, MirrorStore, MirroredDocument, StorageError, StorageResult,
};
use time::OffsetDateTime;
use uuid::Uuid;

/// In-memory document mirror keyed on `ref_key`.
#[derive(Debug, Default)]
pub struct MemoryMirrorStore {
    documents: DashMap<String, MirroredDocument>,
}

impl MemoryMirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts unless `ref_key` is taken. Returns `None` on a duplicate.
    fn insert_if_absent(&self, ref_key: &str, title: &str) -> Option<MirroredDocument> {
        match self.documents.entry(ref_key.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let doc = MirroredDocument {
                    id: Uuid::new_v4(),
                    ref_key: ref_key.to_string(),
                    title: title.to_string(),
                    created_at: OffsetDateTime::now_utc(),
                };
                slot.insert(doc.clone());
                Some(doc)
            }
        }
    }
}

#[async_trait]
impl MirrorStore for MemoryMirrorStore {
    async fn create(&self, ref_key: &str, title: &str) -> StorageResult<MirroredDocument> {
        self.insert_if_absent(ref_key, title).ok_or_else(|| {
            StorageError::conflict(format!("document with ref_key '{ref_key}' already exists"))
        })
    }

    async fn create_many(&self, documents: &[ImportedDocument]) -> StorageResult<u64> {
        let inserted = documents
            .iter()
            .filter(|doc| self.insert_if_absent(&doc.ref_key, &doc.title).is_some())
            .count();

        tracing::debug!(
            requested = documents.len(),
            inserted,
            "Bulk insert into mirror"
        );

        Ok(inserted as u64)
    }

    async fn find_by_ref_key(&self, ref_key: &str) -> StorageResult<Option<MirroredDocument>> {
        Ok(self.documents.get(ref_key).map(|entry| entry.value().clone()))
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.documents.len() as u64)
    }
}
