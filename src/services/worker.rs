use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::models::{DocumentType, DroppedFile, FileLinkage, LinkTarget};
use crate::services::drop_queue::DropQueue;
use crate::services::location::LocationResolver;
use crate::services::metadata_store::MetadataStore;
use crate::services::session::SessionProvider;
use crate::services::upload::UploadOrchestrator;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{Fuse, FusedFuture, FutureExt};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

/// What the worker does with one dropped file. An error sends the file to
/// quarantine.
#[async_trait]
pub trait DroppedFileHandler: Send + Sync {
    async fn handle(&self, file: &DroppedFile) -> SyncResult<()>;
}

/// Uploads a dropped file on behalf of its creator, using the document type
/// and owning resource recorded for it in the metadata store.
pub struct DropUploader {
    orchestrator: Arc<UploadOrchestrator>,
    store: Arc<dyn MetadataStore>,
    sessions: Arc<dyn SessionProvider>,
}

impl DropUploader {
    pub fn new(
        orchestrator: Arc<UploadOrchestrator>,
        store: Arc<dyn MetadataStore>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            orchestrator,
            store,
            sessions,
        }
    }
}

#[async_trait]
impl DroppedFileHandler for DropUploader {
    async fn handle(&self, file: &DroppedFile) -> SyncResult<()> {
        let local_uri = file.local_uri();

        let document = self
            .store
            .get_dropped_file(&local_uri)
            .await?
            .ok_or_else(|| SyncError::ResourceLookupFailed {
                resource: "local file",
                id: local_uri.clone(),
            })?;

        let type_uri = document.document_type_uri.clone().unwrap_or_default();
        let document_type = DocumentType::from_uri(&type_uri)
            .ok_or_else(|| SyncError::UnsupportedDocumentType(type_uri.clone()))?;
        let shape = LocationResolver::expected_shape(document_type)
            .ok_or_else(|| SyncError::UnsupportedDocumentType(document_type.to_string()))?;
        let context =
            document
                .context_for(shape)
                .ok_or_else(|| SyncError::ResourceLookupFailed {
                    resource: shape.as_str(),
                    id: document.file_id.clone(),
                })?;

        let session = self
            .sessions
            .get_active_session_for_creator(&local_uri)
            .await?
            .ok_or_else(|| SyncError::NoActiveSession(local_uri.clone()))?;

        let content = tokio::fs::read(&file.absolute_path).await?;
        let size = content.len() as u64;

        self.orchestrator
            .upload(
                document_type,
                &context,
                FileLinkage::new(LinkTarget::LocalFile(local_uri), document_type),
                Bytes::from(content),
                size,
                &session,
            )
            .await?;
        Ok(())
    }
}

/// Polls the drop directory and uploads what it finds, one file at a time.
pub struct DropWorker {
    drop_directory: PathBuf,
    failed_directory: PathBuf,
    scan_interval: Duration,
    queue: Mutex<DropQueue>,
    handler: Arc<dyn DroppedFileHandler>,
}

impl DropWorker {
    pub fn new(config: &SyncConfig, handler: Arc<dyn DroppedFileHandler>) -> Self {
        Self {
            drop_directory: config.drop_directory.clone(),
            failed_directory: config.failed_directory(),
            // `tokio::time::interval` panics on a zero period.
            scan_interval: config.scan_interval.max(MIN_SCAN_INTERVAL),
            queue: Mutex::new(DropQueue::new()),
            handler,
        }
    }

    // Never held across an await.
    fn queue(&self) -> MutexGuard<'_, DropQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn queued(&self) -> usize {
        self.queue().len()
    }

    pub fn is_handling(&self) -> bool {
        self.queue().is_handling()
    }

    /// Creates the drop and quarantine directories when missing.
    pub async fn prepare_directories(&self) -> SyncResult<()> {
        tokio::fs::create_dir_all(&self.drop_directory).await?;
        tokio::fs::create_dir_all(&self.failed_directory).await?;
        Ok(())
    }

    /// Enqueues the regular, non-hidden files of the drop directory in name
    /// order. Returns how many were new.
    pub async fn scan(&self) -> SyncResult<usize> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.drop_directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = ?entry.path(), "Skipping file with a non UTF-8 name");
                continue;
            };
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();

        let added = {
            let mut queue = self.queue();
            names.iter().filter(|n| queue.add_to_queue(n)).count()
        };
        if added > 0 {
            tracing::info!(added, directory = %self.drop_directory.display(), "📥 Queued dropped files");
        }
        Ok(added)
    }

    /// Processes queued files until the queue is empty or `stop` is set.
    /// Returns immediately when a drain is already running.
    pub async fn drain(&self, stop: &watch::Receiver<bool>) {
        let mut next = {
            let mut queue = self.queue();
            if queue.is_handling() {
                return;
            }
            queue.advance()
        };

        while let Some(name) = next {
            self.process(&name).await;

            next = {
                let mut queue = self.queue();
                if *stop.borrow() {
                    queue.finish();
                    None
                } else {
                    queue.advance()
                }
            };
        }
    }

    async fn process(&self, name: &str) {
        let file = DroppedFile {
            name: name.to_string(),
            absolute_path: self.drop_directory.join(name),
        };
        tracing::info!(file = name, "📤 Uploading dropped file");

        match self.handler.handle(&file).await {
            Ok(()) => {
                if let Err(e) = tokio::fs::remove_file(&file.absolute_path).await {
                    tracing::error!(file = name, "Uploaded but failed to remove source: {}", e);
                    self.quarantine(&file).await;
                } else {
                    tracing::info!(file = name, "✅ Dropped file uploaded");
                }
            }
            Err(e) => {
                tracing::error!(file = name, "❌ Failed to upload dropped file: {}", e);
                self.quarantine(&file).await;
            }
        }
    }

    async fn quarantine(&self, file: &DroppedFile) {
        let target = self.failed_directory.join(&file.name);
        match tokio::fs::rename(&file.absolute_path, &target).await {
            Ok(()) => tracing::warn!(
                file = %file.name,
                target = %target.display(),
                "Moved file to quarantine"
            ),
            Err(e) => tracing::error!(
                file = %file.name,
                "Failed to move file to quarantine: {}",
                e
            ),
        }
    }

    /// Scans on a fixed interval until `shutdown` flips. A scan that finds new
    /// files starts a drain unless one is running. On shutdown the file in
    /// flight is finished.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            directory = %self.drop_directory.display(),
            interval_ms = self.scan_interval.as_millis() as u64,
            "🚀 Drop worker started"
        );

        if let Err(e) = self.prepare_directories().await {
            tracing::error!("Cannot prepare drop directories: {}", e);
            return;
        }

        let stop = shutdown.clone();
        let mut ticker = tokio::time::interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let drain = Fuse::terminated();
        tokio::pin!(drain);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("🛑 Drop worker shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.scan().await {
                        Ok(added) if added > 0 && drain.is_terminated() => {
                            drain.set(self.drain(&stop).fuse());
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!("Failed to scan drop directory: {}", e),
                    }
                }
                _ = &mut drain, if !drain.is_terminated() => {
                    tracing::debug!("Drop queue drained");
                }
            }
        }

        if !drain.is_terminated() {
            drain.await;
        }
        tracing::info!("👋 Drop worker stopped");
    }
}
