#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use cloud_file_sync::error::{SyncError, SyncResult};
use cloud_file_sync::infrastructure::database::run_migrations;
use cloud_file_sync::models::{
    ConflictBehavior, DroppedDocument, FileLinkage, FileMetadataEntry, InterventionInfo,
    InvoiceInfo, LocationSpec, OfferInfo, OrderInfo, ProductionTicketInfo, RequestInfo,
    SessionHandle, UploadedFileRecord,
};
use cloud_file_sync::services::metadata_store::MetadataStore;
use cloud_file_sync::services::session::SessionProvider;
use cloud_file_sync::services::storage::RemoteStorage;
use cloud_file_sync::utils::naming::file_extension;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn remote_created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn test_session() -> SessionHandle {
    SessionHandle {
        session_id: "session-1".to_string(),
        access_token: "token-1".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub async fn setup_test_db() -> DatabaseConnection {
    // A single connection keeps one in-memory database for the whole test.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    run_migrations(&db).await.unwrap();
    db
}

/// Remote storage that keeps uploads in memory.
#[derive(Default)]
pub struct MockRemoteStorage {
    pub uploads: Mutex<Vec<(LocationSpec, Bytes)>>,
    pub deleted: Mutex<Vec<String>>,
    pub failing_paths: Mutex<HashSet<String>>,
    pub fail_deletes: bool,
    pub download_urls: Mutex<HashMap<String, String>>,
}

impl MockRemoteStorage {
    pub fn failing_on(paths: &[&str]) -> Self {
        let storage = Self::default();
        storage
            .failing_paths
            .lock()
            .unwrap()
            .extend(paths.iter().map(|p| p.to_string()));
        storage
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(l, _)| l.full_path())
            .collect()
    }
}

#[async_trait]
impl RemoteStorage for MockRemoteStorage {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    async fn upload_file(
        &self,
        _session: &SessionHandle,
        location: &LocationSpec,
        content: Bytes,
        size: u64,
        _conflict: ConflictBehavior,
    ) -> SyncResult<UploadedFileRecord> {
        let path = location.full_path();
        if self.failing_paths.lock().unwrap().contains(&path) {
            return Err(SyncError::RemoteUploadFailed(format!("refused {}", path)));
        }

        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((location.clone(), content));
        Ok(UploadedFileRecord {
            remote_id: format!("remote-{}", uploads.len()),
            name: location.file_name.clone(),
            url: format!("https://drive.example{}", path),
            size: size as i64,
            mime_type: "application/pdf".to_string(),
            created_at: remote_created_at(),
            modified_at: remote_created_at(),
        })
    }

    async fn delete_file(&self, _session: &SessionHandle, remote_id: &str) -> SyncResult<()> {
        if self.fail_deletes {
            return Err(SyncError::RemoteDeleteFailed("drive unavailable".to_string()));
        }
        self.deleted.lock().unwrap().push(remote_id.to_string());
        Ok(())
    }

    async fn get_download_url(
        &self,
        _session: &SessionHandle,
        remote_id: &str,
    ) -> SyncResult<Option<String>> {
        Ok(self.download_urls.lock().unwrap().get(remote_id).cloned())
    }

    async fn find_file_by_location(
        &self,
        _session: &SessionHandle,
        location: &LocationSpec,
    ) -> SyncResult<Option<String>> {
        let uploads = self.uploads.lock().unwrap();
        Ok(uploads
            .iter()
            .position(|(l, _)| l == location)
            .map(|i| format!("remote-{}", i + 1)))
    }
}

/// Metadata store backed by hash maps. Counts business lookups.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    pub lookups: AtomicUsize,
    pub case_identifiers: HashMap<String, String>,
    pub requests: HashMap<String, RequestInfo>,
    pub interventions: HashMap<String, InterventionInfo>,
    pub offers: HashMap<String, OfferInfo>,
    pub orders: HashMap<String, OrderInfo>,
    pub invoices: HashMap<String, InvoiceInfo>,
    pub production_tickets: HashMap<String, ProductionTicketInfo>,
    pub dropped: HashMap<String, DroppedDocument>,
    pub inserted: Mutex<Vec<(UploadedFileRecord, FileLinkage)>>,
    pub remote_ids: Mutex<HashMap<String, String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl InMemoryMetadataStore {
    fn lookup<T: Clone>(&self, map: &HashMap<String, T>, id: &str) -> SyncResult<Option<T>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(map.get(id).cloned())
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn insert_uploaded_file(
        &self,
        record: &UploadedFileRecord,
        linkage: &FileLinkage,
    ) -> SyncResult<FileMetadataEntry> {
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push((record.clone(), linkage.clone()));
        let id = format!("file-{}", inserted.len());
        self.remote_ids
            .lock()
            .unwrap()
            .insert(id.clone(), record.remote_id.clone());
        Ok(FileMetadataEntry {
            id,
            name: record.name.clone(),
            format: record.mime_type.clone(),
            size: record.size,
            extension: file_extension(&record.name),
            created_at: record.created_at,
            document_type: linkage.document_type,
        })
    }

    async fn get_remote_id(&self, local_id: &str) -> SyncResult<Option<String>> {
        Ok(self.remote_ids.lock().unwrap().get(local_id).cloned())
    }

    async fn get_local_id(&self, remote_id: &str) -> SyncResult<Option<String>> {
        Ok(self
            .remote_ids
            .lock()
            .unwrap()
            .iter()
            .find(|(_, r)| r.as_str() == remote_id)
            .map(|(l, _)| l.clone()))
    }

    async fn delete_file(&self, local_id: &str) -> SyncResult<()> {
        self.remote_ids.lock().unwrap().remove(local_id);
        self.deleted.lock().unwrap().push(local_id.to_string());
        Ok(())
    }

    async fn get_dropped_file(&self, local_uri: &str) -> SyncResult<Option<DroppedDocument>> {
        Ok(self.dropped.get(local_uri).cloned())
    }

    async fn get_case_identifier(&self, case_id: &str) -> SyncResult<Option<String>> {
        self.lookup(&self.case_identifiers, case_id)
    }

    async fn get_request_info(&self, case_id: &str) -> SyncResult<Option<RequestInfo>> {
        self.lookup(&self.requests, case_id)
    }

    async fn get_intervention_info(
        &self,
        intervention_id: &str,
    ) -> SyncResult<Option<InterventionInfo>> {
        self.lookup(&self.interventions, intervention_id)
    }

    async fn get_offer_info(&self, offer_id: &str) -> SyncResult<Option<OfferInfo>> {
        self.lookup(&self.offers, offer_id)
    }

    async fn get_order_info(&self, order_id: &str) -> SyncResult<Option<OrderInfo>> {
        self.lookup(&self.orders, order_id)
    }

    async fn get_invoice_info(&self, invoice_id: &str) -> SyncResult<Option<InvoiceInfo>> {
        self.lookup(&self.invoices, invoice_id)
    }

    async fn get_production_ticket_info(
        &self,
        order_id: &str,
    ) -> SyncResult<Option<ProductionTicketInfo>> {
        self.lookup(&self.production_tickets, order_id)
    }
}

/// Session provider with a fixed set of sessions.
#[derive(Default)]
pub struct MockSessionProvider {
    pub by_creator_uri: HashMap<String, SessionHandle>,
    pub by_id: HashMap<String, SessionHandle>,
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn get_active_session_for_creator(
        &self,
        local_uri: &str,
    ) -> SyncResult<Option<SessionHandle>> {
        Ok(self.by_creator_uri.get(local_uri).cloned())
    }

    async fn get_session(&self, session_id: &str) -> SyncResult<Option<SessionHandle>> {
        Ok(self.by_id.get(session_id).cloned())
    }
}
