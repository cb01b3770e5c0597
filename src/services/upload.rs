use crate::error::{SyncError, SyncResult};
use crate::models::{
    ConflictBehavior, DocumentContext, DocumentType, FileLinkage, FileMetadataEntry,
    SessionHandle,
};
use crate::services::location::LocationResolver;
use crate::services::metadata_store::MetadataStore;
use crate::services::storage::RemoteStorage;
use bytes::Bytes;
use std::sync::Arc;

/// One logical upload: resolve, push to the canonical location, record it,
/// then write the untracked copies.
pub struct UploadOrchestrator {
    resolver: LocationResolver,
    remote: Arc<dyn RemoteStorage>,
    store: Arc<dyn MetadataStore>,
    conflict: ConflictBehavior,
}

impl UploadOrchestrator {
    pub fn new(
        resolver: LocationResolver,
        remote: Arc<dyn RemoteStorage>,
        store: Arc<dyn MetadataStore>,
        conflict: ConflictBehavior,
    ) -> Self {
        Self {
            resolver,
            remote,
            store,
            conflict,
        }
    }

    pub async fn upload(
        &self,
        document_type: DocumentType,
        context: &DocumentContext,
        linkage: FileLinkage,
        content: Bytes,
        size: u64,
        session: &SessionHandle,
    ) -> SyncResult<FileMetadataEntry> {
        let locations = self
            .resolver
            .resolve(document_type, context, self.store.as_ref())
            .await?;
        let Some((canonical, copies)) = locations.split_first() else {
            return Err(SyncError::UnsupportedDocumentType(document_type.to_string()));
        };

        let record = self
            .remote
            .upload_file(session, canonical, content.clone(), size, self.conflict)
            .await?;
        let entry = self.store.insert_uploaded_file(&record, &linkage).await?;

        tracing::info!(
            file_id = %entry.id,
            remote_id = %record.remote_id,
            document_type = %document_type,
            backend = self.remote.backend_name(),
            "✅ Uploaded {}",
            canonical.full_path()
        );

        // Copies are best-effort and never tracked.
        for copy in copies {
            match self
                .remote
                .upload_file(session, copy, content.clone(), size, self.conflict)
                .await
            {
                Ok(copied) => tracing::debug!(
                    path = %copy.full_path(),
                    remote_id = %copied.remote_id,
                    "Uploaded untracked copy"
                ),
                Err(e) => tracing::warn!(
                    path = %copy.full_path(),
                    "Failed to upload untracked copy: {}",
                    e
                ),
            }
        }

        Ok(entry)
    }

    /// Deletes the remote file and its metadata. A remote failure is logged and
    /// the metadata is removed anyway.
    pub async fn delete(&self, local_id: &str, session: &SessionHandle) -> SyncResult<()> {
        let remote_id = self
            .store
            .get_remote_id(local_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("file {}", local_id)))?;

        if let Err(e) = self.remote.delete_file(session, &remote_id).await {
            tracing::warn!(
                file_id = local_id,
                remote_id = %remote_id,
                "Remote delete failed, removing metadata anyway: {}",
                e
            );
        }

        self.store.delete_file(local_id).await?;
        tracing::info!(file_id = local_id, "🗑️ Deleted file");
        Ok(())
    }

    pub async fn download_url(&self, local_id: &str, session: &SessionHandle) -> SyncResult<String> {
        let remote_id = self
            .store
            .get_remote_id(local_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("file {}", local_id)))?;

        self.remote
            .get_download_url(session, &remote_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("remote file {}", remote_id)))
    }
}
