//! Remote storage clients.
//!
//! A client only moves bytes to and from the remote backend. Recording what was
//! uploaded is the metadata store's job.

use crate::error::SyncResult;
use crate::models::{ConflictBehavior, LocationSpec, SessionHandle, UploadedFileRecord};
use async_trait::async_trait;
use bytes::Bytes;

pub mod graph;
pub mod s3;

pub use graph::GraphDriveStorage;
pub use s3::S3RemoteStorage;

#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Short backend identifier used in logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Upload `content` to `location`. On a name clash the backend applies `conflict`.
    async fn upload_file(
        &self,
        session: &SessionHandle,
        location: &LocationSpec,
        content: Bytes,
        size: u64,
        conflict: ConflictBehavior,
    ) -> SyncResult<UploadedFileRecord>;

    async fn delete_file(&self, session: &SessionHandle, remote_id: &str) -> SyncResult<()>;

    /// Temporary download URL. `None` when the remote file does not exist.
    async fn get_download_url(
        &self,
        session: &SessionHandle,
        remote_id: &str,
    ) -> SyncResult<Option<String>>;

    /// Remote id of the file at `location`, if any.
    async fn find_file_by_location(
        &self,
        session: &SessionHandle,
        location: &LocationSpec,
    ) -> SyncResult<Option<String>>;
}

/// Best guess of a MIME type from content, falling back to the file name.
pub(crate) fn guess_mime_type(content: &[u8], name: &str) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }
    let by_extension = match crate::utils::naming::file_extension(name)
        .to_lowercase()
        .as_str()
    {
        "csv" => mime::TEXT_CSV,
        "txt" => mime::TEXT_PLAIN,
        "pdf" => mime::APPLICATION_PDF,
        "json" => mime::APPLICATION_JSON,
        _ => mime::APPLICATION_OCTET_STREAM,
    };
    by_extension.to_string()
}
