use crate::models::ConflictBehavior;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Remote root directory per document-type family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoots {
    pub attachments: String,
    pub reports: String,
    pub offers: String,
    pub orders: String,
    pub delivery_notes: String,
    pub invoices: String,
    pub production_tickets: String,
    pub accountancy_exports: String,
}

impl Default for StorageRoots {
    fn default() -> Self {
        Self {
            attachments: "/crm-development/attachments".to_string(),
            reports: "/crm-development/reports".to_string(),
            offers: "/crm-development/offers".to_string(),
            orders: "/crm-development/orders".to_string(),
            delivery_notes: "/crm-development/delivery-notes".to_string(),
            invoices: "/crm-development/invoices".to_string(),
            production_tickets: "/crm-development/production-tickets".to_string(),
            accountancy_exports: "/crm-development/winbooks".to_string(),
        }
    }
}

impl StorageRoots {
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            attachments: root_var("ATTACHMENTS_FOLDER", default.attachments),
            reports: root_var("REPORTS_FOLDER", default.reports),
            offers: root_var("OFFERS_FOLDER", default.offers),
            orders: root_var("ORDERS_FOLDER", default.orders),
            delivery_notes: root_var("DELIVERY_NOTES_FOLDER", default.delivery_notes),
            invoices: root_var("INVOICE_STORAGE_LOCATION", default.invoices),
            production_tickets: root_var("PRODUCTION_TICKETS_FOLDER", default.production_tickets),
            accountancy_exports: root_var("ACCOUNTANCY_EXPORT_DIR", default.accountancy_exports),
        }
    }
}

/// Remote paths are always absolute and never end with a slash.
fn root_var(key: &str, default: String) -> String {
    let value = env::var(key).unwrap_or(default);
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Which remote storage client to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Graph,
    S3,
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory polled for dropped files (default: "/upload")
    pub drop_directory: PathBuf,

    /// Interval between two scans of the drop directory (default: 10 s)
    pub scan_interval: Duration,

    /// Remote root per document-type family
    pub roots: StorageRoots,

    /// Behavior when the remote target name is taken (default: rename)
    pub conflict_behavior: ConflictBehavior,

    /// Storage backend: "graph" or "s3" (default: "graph")
    pub storage_backend: StorageBackendKind,

    /// Graph API base URL (default: "https://graph.microsoft.com/v1.0")
    pub graph_api_base_url: String,

    /// Drive the Graph client writes to
    pub ms_drive_id: Option<String>,

    /// S3-compatible endpoint, credentials and bucket
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drop_directory: PathBuf::from("/upload"),
            scan_interval: Duration::from_millis(10_000),
            roots: StorageRoots::default(),
            conflict_behavior: ConflictBehavior::Rename,
            storage_backend: StorageBackendKind::Graph,
            graph_api_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            ms_drive_id: None,
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_bucket: None,
            s3_region: "us-east-1".to_string(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            drop_directory: env::var("FILE_DROP_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(default.drop_directory),

            scan_interval: env::var("FILE_DROP_SYNC_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(default.scan_interval),

            roots: StorageRoots::from_env(),

            conflict_behavior: env::var("UPLOAD_CONFLICT_BEHAVIOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.conflict_behavior),

            storage_backend: match env::var("STORAGE_BACKEND") {
                Ok(v) if v.eq_ignore_ascii_case("s3") => StorageBackendKind::S3,
                _ => default.storage_backend,
            },

            graph_api_base_url: env::var("GRAPH_API_BASE_URL")
                .unwrap_or(default.graph_api_base_url),
            ms_drive_id: env::var("MS_DRIVE_ID").ok(),

            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),
        }
    }

    /// Quarantine directory for files that failed to upload
    pub fn failed_directory(&self) -> PathBuf {
        self.drop_directory.join("failed")
    }

    /// Create config for development (local drop directory, fast scans)
    pub fn development() -> Self {
        Self {
            drop_directory: PathBuf::from("./upload"),
            scan_interval: Duration::from_millis(2_000),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.drop_directory, PathBuf::from("/upload"));
        assert_eq!(config.failed_directory(), PathBuf::from("/upload/failed"));
        assert_eq!(config.scan_interval, Duration::from_secs(10));
        assert_eq!(config.conflict_behavior, ConflictBehavior::Rename);
        assert_eq!(config.roots.accountancy_exports, "/crm-development/winbooks");
    }

    #[test]
    fn test_development_config() {
        let config = SyncConfig::development();
        assert_eq!(config.scan_interval, Duration::from_secs(2));
        assert_eq!(config.storage_backend, StorageBackendKind::Graph);
    }

    #[test]
    fn test_zero_scan_interval_falls_back_to_default() {
        unsafe { env::set_var("FILE_DROP_SYNC_INTERVAL_MS", "0") };
        let config = SyncConfig::from_env();
        unsafe { env::remove_var("FILE_DROP_SYNC_INTERVAL_MS") };
        assert_eq!(config.scan_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_root_var_normalizes_slashes() {
        unsafe { env::set_var("TEST_ROOT_VAR_NORMALIZE", "crm/attachments/") };
        let root = root_var("TEST_ROOT_VAR_NORMALIZE", "/unused".to_string());
        unsafe { env::remove_var("TEST_ROOT_VAR_NORMALIZE") };
        assert_eq!(root, "/crm/attachments");
    }

    #[test]
    fn test_root_var_falls_back_to_default() {
        unsafe { env::remove_var("TEST_ROOT_VAR_MISSING") };
        let root = root_var("TEST_ROOT_VAR_MISSING", "/crm-development/offers".to_string());
        assert_eq!(root, "/crm-development/offers");
    }
}
