use thiserror::Error;

/// Errors raised by the resolver, the orchestrator and their collaborators.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Upload location not implemented for document type '{0}'")]
    UnsupportedDocumentType(String),

    #[error("Document type '{document_type}' expects a {expected} context, got {actual}")]
    InvalidContext {
        document_type: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Unable to find {resource} with id '{id}'")]
    ResourceLookupFailed { resource: &'static str, id: String },

    #[error("No active session with a valid access token found for creator of file {0}")]
    NoActiveSession(String),

    #[error("Remote upload failed: {0}")]
    RemoteUploadFailed(String),

    #[error("Remote delete failed: {0}")]
    RemoteDeleteFailed(String),

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Metadata store error: {0}")]
    Metadata(#[from] sea_orm::DbErr),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
