use super::RemoteStorage;
use crate::error::{SyncError, SyncResult};
use crate::models::{ConflictBehavior, LocationSpec, SessionHandle, UploadedFileRecord};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use serde_json::json;

/// Upload session ranges must be a multiple of 320 KiB.
const UPLOAD_RANGE_SIZE: usize = 10 * 320 * 1024;

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Drive client for the Graph drive-item API. Requests run on behalf of the
/// user owning the session passed to each call.
pub struct GraphDriveStorage {
    http: Client,
    base_url: String,
    drive_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveItem {
    id: String,
    name: String,
    web_url: Option<String>,
    size: Option<i64>,
    file: Option<FileFacet>,
    created_date_time: DateTime<Utc>,
    last_modified_date_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileFacet {
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSession {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct DownloadUrl {
    #[serde(rename = "@microsoft.graph.downloadUrl")]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    id: String,
}

impl From<DriveItem> for UploadedFileRecord {
    fn from(item: DriveItem) -> Self {
        UploadedFileRecord {
            remote_id: item.id,
            name: item.name,
            url: item.web_url.unwrap_or_default(),
            size: item.size.unwrap_or(0),
            mime_type: item
                .file
                .and_then(|f| f.mime_type)
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
            created_at: item.created_date_time,
            modified_at: item.last_modified_date_time,
        }
    }
}

impl GraphDriveStorage {
    pub fn new(base_url: &str, drive_id: String) -> SyncResult<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("Invalid Graph API URL {}: {}", base_url, e)))?;
        Ok(Self {
            http: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            drive_id,
        })
    }

    fn item_by_path_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
            .collect();
        format!(
            "{}/drives/{}/root:/{}",
            self.base_url,
            self.drive_id,
            encoded.join("/")
        )
    }

    fn item_by_id_url(&self, remote_id: &str) -> String {
        format!(
            "{}/drives/{}/items/{}",
            self.base_url,
            self.drive_id,
            utf8_percent_encode(remote_id, PATH_SEGMENT)
        )
    }

    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("{} {}", status, body)
    }

    /// Zero-byte files cannot go through an upload session.
    async fn put_empty(
        &self,
        session: &SessionHandle,
        path: &str,
        conflict: ConflictBehavior,
    ) -> SyncResult<DriveItem> {
        let url = format!(
            "{}:/content?@microsoft.graph.conflictBehavior={}",
            self.item_by_path_url(path),
            conflict.as_str()
        );
        let response = self
            .http
            .put(url)
            .bearer_auth(&session.access_token)
            .header(header::CONTENT_LENGTH, 0)
            .body(Vec::new())
            .send()
            .await
            .map_err(|e| SyncError::RemoteUploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::RemoteUploadFailed(
                Self::error_text(response).await,
            ));
        }
        response
            .json::<DriveItem>()
            .await
            .map_err(|e| SyncError::RemoteUploadFailed(e.to_string()))
    }

    async fn upload_in_ranges(
        &self,
        session: &SessionHandle,
        path: &str,
        content: &Bytes,
        conflict: ConflictBehavior,
    ) -> SyncResult<DriveItem> {
        let create_url = format!("{}:/createUploadSession", self.item_by_path_url(path));
        let body = json!({
            "item": { "@microsoft.graph.conflictBehavior": conflict.as_str() }
        });

        let response = self
            .http
            .post(create_url)
            .bearer_auth(&session.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUploadFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SyncError::RemoteUploadFailed(
                Self::error_text(response).await,
            ));
        }
        let upload_session: UploadSession = response
            .json()
            .await
            .map_err(|e| SyncError::RemoteUploadFailed(e.to_string()))?;

        let total = content.len();
        let mut start = 0;
        loop {
            let end = (start + UPLOAD_RANGE_SIZE).min(total);
            let chunk = content.slice(start..end);

            // The pre-authenticated upload URL must not carry the bearer token.
            let response = self
                .http
                .put(&upload_session.upload_url)
                .header(header::CONTENT_LENGTH, chunk.len())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end - 1, total),
                )
                .body(chunk)
                .send()
                .await
                .map_err(|e| SyncError::RemoteUploadFailed(e.to_string()))?;

            match response.status() {
                StatusCode::ACCEPTED => {
                    tracing::debug!(
                        path = %path,
                        "Upload in progress: [{}-{}] bytes of content uploaded",
                        start,
                        end - 1
                    );
                }
                StatusCode::OK | StatusCode::CREATED => {
                    return response
                        .json::<DriveItem>()
                        .await
                        .map_err(|e| SyncError::RemoteUploadFailed(e.to_string()));
                }
                _ => {
                    return Err(SyncError::RemoteUploadFailed(
                        Self::error_text(response).await,
                    ));
                }
            }

            if end >= total {
                return Err(SyncError::RemoteUploadFailed(format!(
                    "Upload session for {} accepted all {} bytes without returning the item",
                    path, total
                )));
            }
            start = end;
        }
    }
}

#[async_trait]
impl RemoteStorage for GraphDriveStorage {
    fn backend_name(&self) -> &'static str {
        "graph"
    }

    async fn upload_file(
        &self,
        session: &SessionHandle,
        location: &LocationSpec,
        content: Bytes,
        size: u64,
        conflict: ConflictBehavior,
    ) -> SyncResult<UploadedFileRecord> {
        let path = location.full_path();
        if size != content.len() as u64 {
            tracing::warn!(
                path = %path,
                declared = size,
                actual = content.len(),
                "Declared size differs from content length, using content length"
            );
        }

        tracing::info!(drive = %self.drive_id, path = %path, "Starting upload to drive");
        let result = if content.is_empty() {
            self.put_empty(session, &path, conflict).await
        } else {
            self.upload_in_ranges(session, &path, &content, conflict).await
        };

        match result {
            Ok(item) => {
                tracing::info!(
                    drive = %self.drive_id,
                    path = %path,
                    item_id = %item.id,
                    "Upload to drive succeeded"
                );
                Ok(item.into())
            }
            Err(e) => {
                tracing::error!(drive = %self.drive_id, path = %path, "Upload to drive failed: {}", e);
                Err(e)
            }
        }
    }

    async fn delete_file(&self, session: &SessionHandle, remote_id: &str) -> SyncResult<()> {
        let response = self
            .http
            .delete(self.item_by_id_url(remote_id))
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| SyncError::RemoteDeleteFailed(e.to_string()))?;

        if response.status().is_success() {
            tracing::info!(drive = %self.drive_id, remote_id, "Deleted file from drive");
            Ok(())
        } else {
            let text = Self::error_text(response).await;
            tracing::error!(drive = %self.drive_id, remote_id, "Failed to delete file: {}", text);
            Err(SyncError::RemoteDeleteFailed(text))
        }
    }

    async fn get_download_url(
        &self,
        session: &SessionHandle,
        remote_id: &str,
    ) -> SyncResult<Option<String>> {
        let url = format!(
            "{}?select=id,@microsoft.graph.downloadUrl",
            self.item_by_id_url(remote_id)
        );
        let response = self
            .http
            .get(url)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::info!(drive = %self.drive_id, remote_id, "File not found on drive");
                Ok(None)
            }
            status if status.is_success() => {
                let body: DownloadUrl = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Remote(e.to_string()))?;
                Ok(body.download_url)
            }
            _ => Err(SyncError::Remote(Self::error_text(response).await)),
        }
    }

    async fn find_file_by_location(
        &self,
        session: &SessionHandle,
        location: &LocationSpec,
    ) -> SyncResult<Option<String>> {
        let url = format!(
            "{}?select=id,name",
            self.item_by_path_url(&location.full_path())
        );
        let response = self
            .http
            .get(url)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| SyncError::Remote(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let item: ItemId = response
                    .json()
                    .await
                    .map_err(|e| SyncError::Remote(e.to_string()))?;
                Ok(Some(item.id))
            }
            _ => Err(SyncError::Remote(Self::error_text(response).await)),
        }
    }
}
