use super::{RemoteStorage, guess_mime_type};
use crate::error::{SyncError, SyncResult};
use crate::models::{ConflictBehavior, LocationSpec, SessionHandle, UploadedFileRecord};
use crate::utils::naming::split_extension;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Highest numeric suffix tried when renaming on conflict.
const MAX_RENAME_ATTEMPTS: u32 = 1000;

const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(3600);

/// S3-compatible backend. Object keys mirror the drive layout
/// (`{directory}/{name}` without the leading slash) and double as remote ids.
///
/// Credentials are service-wide, so the session passed to each call is only
/// used for logging.
pub struct S3RemoteStorage {
    client: Client,
    bucket: String,
}

impl S3RemoteStorage {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn key_for(location: &LocationSpec) -> String {
        location.full_path().trim_start_matches('/').to_string()
    }

    async fn object_exists(&self, key: &str) -> SyncResult<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(SyncError::Remote(service_error.to_string()))
                }
            }
        }
    }

    /// Picks the key to write to, applying the conflict behavior.
    async fn target_key(
        &self,
        location: &LocationSpec,
        conflict: ConflictBehavior,
    ) -> SyncResult<String> {
        let key = Self::key_for(location);
        if conflict == ConflictBehavior::Replace || !self.object_exists(&key).await? {
            return Ok(key);
        }
        if conflict == ConflictBehavior::Fail {
            return Err(SyncError::RemoteUploadFailed(format!(
                "An object already exists at {}",
                key
            )));
        }

        let (stem, ext) = split_extension(&location.file_name);
        for n in 1..=MAX_RENAME_ATTEMPTS {
            let candidate = LocationSpec::new(
                location.directory_path.clone(),
                format!("{} {}{}", stem, n, ext),
            );
            let candidate_key = Self::key_for(&candidate);
            if !self.object_exists(&candidate_key).await? {
                return Ok(candidate_key);
            }
        }
        Err(SyncError::RemoteUploadFailed(format!(
            "No free name found for {} after {} attempts",
            key, MAX_RENAME_ATTEMPTS
        )))
    }
}

fn to_chrono(value: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    value
        .and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()))
        .unwrap_or_default()
}

#[async_trait]
impl RemoteStorage for S3RemoteStorage {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn upload_file(
        &self,
        session: &SessionHandle,
        location: &LocationSpec,
        content: Bytes,
        _size: u64,
        conflict: ConflictBehavior,
    ) -> SyncResult<UploadedFileRecord> {
        let key = self.target_key(location, conflict).await?;
        let content_type = guess_mime_type(&content, &location.file_name);

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            session = %session.session_id,
            "Starting upload to bucket"
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.bucket, key = %key, "S3 put_object failed: {:?}", e);
                SyncError::RemoteUploadFailed(e.to_string())
            })?;

        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUploadFailed(e.to_string()))?;

        let modified = to_chrono(head.last_modified());
        let name = key.rsplit('/').next().unwrap_or(&key).to_string();

        Ok(UploadedFileRecord {
            remote_id: key.clone(),
            name,
            url: format!("s3://{}/{}", self.bucket, key),
            size: head.content_length().unwrap_or(0),
            mime_type: head
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or(content_type),
            created_at: modified,
            modified_at: modified,
        })
    }

    async fn delete_file(&self, _session: &SessionHandle, remote_id: &str) -> SyncResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(remote_id)
            .send()
            .await
            .map_err(|e| SyncError::RemoteDeleteFailed(e.to_string()))?;
        tracing::info!(bucket = %self.bucket, key = remote_id, "Deleted object");
        Ok(())
    }

    async fn get_download_url(
        &self,
        _session: &SessionHandle,
        remote_id: &str,
    ) -> SyncResult<Option<String>> {
        if !self.object_exists(remote_id).await? {
            return Ok(None);
        }

        let presigning = PresigningConfig::expires_in(DOWNLOAD_URL_TTL)
            .map_err(|e| SyncError::Config(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(remote_id)
            .presigned(presigning)
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        Ok(Some(request.uri().to_string()))
    }

    async fn find_file_by_location(
        &self,
        _session: &SessionHandle,
        location: &LocationSpec,
    ) -> SyncResult<Option<String>> {
        let key = Self::key_for(location);
        Ok(self.object_exists(&key).await?.then_some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_strips_leading_slash() {
        let location = LocationSpec::new("/crm-development/winbooks/", "ACT.csv");
        assert_eq!(
            S3RemoteStorage::key_for(&location),
            "crm-development/winbooks/ACT.csv"
        );
    }
}
