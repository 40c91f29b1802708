//! Import and forwarding orchestration.

use docbridge_core::{
    DynMirrorStore, EditRemoteDocument, ImportSummary, MirroredDocument, RemoteDocument,
    SyncError, SyncResult, UpstreamCredentials,
};
use docbridge_upstream::UpstreamClient;

/// Pulls upstream documents into the local mirror and forwards mutations.
///
/// Forwarded create/update/delete never touch the mirror; it only reflects
/// what the import paths pulled.
#[derive(Clone)]
pub struct SyncReconciler {
    client: UpstreamClient,
    mirror: DynMirrorStore,
}

impl SyncReconciler {
    pub fn new(client: UpstreamClient, mirror: DynMirrorStore) -> Self {
        Self { client, mirror }
    }

    /// Mirrors the full upstream list, skipping documents already present.
    pub async fn import_all(&self, credentials: &UpstreamCredentials) -> SyncResult<ImportSummary> {
        tracing::info!(user = %credentials.user_id(), "Importing all documents from upstream");

        let documents = self.client.list(credentials).await?;
        let inserted = self.mirror.create_many(&documents).await?;
        let summary = ImportSummary::from_counts(documents.len(), inserted);

        tracing::info!(
            count = summary.count,
            skipped = summary.skipped,
            "Imported documents"
        );
        Ok(summary)
    }

    /// Mirrors one upstream document. Returns `None` when it is already mirrored.
    pub async fn import_one(
        &self,
        ref_key: &str,
        credentials: &UpstreamCredentials,
    ) -> SyncResult<Option<MirroredDocument>> {
        tracing::info!(ref_key = %ref_key, "Importing document from upstream");

        let document = self.client.get(credentials, ref_key).await?;
        match self.mirror.create(&document.ref_key, &document.title).await {
            Ok(mirrored) => Ok(Some(mirrored)),
            Err(e) if e.is_conflict() => {
                tracing::info!(ref_key = %ref_key, "Document already mirrored");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn request_create(
        &self,
        edit: &EditRemoteDocument,
        credentials: &UpstreamCredentials,
    ) -> SyncResult<RemoteDocument> {
        edit.validate().map_err(SyncError::bad_request)?;
        tracing::info!(title = %edit.title, "Creating document upstream");

        let created = self.client.create(credentials, &edit.title).await?;
        Ok(created.into())
    }

    pub async fn request_update(
        &self,
        ref_key: &str,
        edit: &EditRemoteDocument,
        credentials: &UpstreamCredentials,
    ) -> SyncResult<RemoteDocument> {
        edit.validate().map_err(SyncError::bad_request)?;
        tracing::info!(ref_key = %ref_key, title = %edit.title, "Updating document upstream");

        let updated = self.client.update(credentials, ref_key, &edit.title).await?;
        Ok(updated.into())
    }

    pub async fn request_remove(
        &self,
        ref_key: &str,
        credentials: &UpstreamCredentials,
    ) -> SyncResult<RemoteDocument> {
        tracing::info!(ref_key = %ref_key, "Removing document upstream");

        let removed = self.client.delete(credentials, ref_key).await?;
        Ok(removed.into())
    }
}
