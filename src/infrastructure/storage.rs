use crate::config::{StorageBackendKind, SyncConfig};
use crate::services::storage::{GraphDriveStorage, RemoteStorage, S3RemoteStorage};
use anyhow::Context;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

/// Builds the remote storage client selected by `STORAGE_BACKEND`.
pub async fn setup_storage(config: &SyncConfig) -> anyhow::Result<Arc<dyn RemoteStorage>> {
    match config.storage_backend {
        StorageBackendKind::Graph => {
            let drive_id = config
                .ms_drive_id
                .clone()
                .context("MS_DRIVE_ID must be set for the graph storage backend")?;
            info!(
                "☁️  Graph drive storage: {} (Drive: {})",
                config.graph_api_base_url, drive_id
            );
            let storage = GraphDriveStorage::new(&config.graph_api_base_url, drive_id)?;
            Ok(Arc::new(storage))
        }
        StorageBackendKind::S3 => {
            let endpoint_url = config
                .s3_endpoint
                .clone()
                .context("S3_ENDPOINT must be set for the s3 storage backend")?;
            let access_key = config.s3_access_key.clone().context("S3_ACCESS_KEY must be set")?;
            let secret_key = config.s3_secret_key.clone().context("S3_SECRET_KEY must be set")?;
            let bucket = config.s3_bucket.clone().context("S3_BUCKET must be set")?;

            info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, bucket);

            let aws_config = aws_config::from_env()
                .endpoint_url(&endpoint_url)
                .region(Region::new(config.s3_region.clone()))
                .credentials_provider(aws_sdk_s3::config::Credentials::new(
                    access_key, secret_key, None, None, "static",
                ))
                .load()
                .await;

            let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true)
                .build();

            let client = aws_sdk_s3::Client::from_conf(s3_config);
            Ok(Arc::new(S3RemoteStorage::new(client, bucket)))
        }
    }
}
