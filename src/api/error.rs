use crate::error::SyncError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotFound(msg) => AppError::NotFound(msg),
            SyncError::NoActiveSession(_) => AppError::Unauthorized(err.to_string()),
            SyncError::UnsupportedDocumentType(_)
            | SyncError::InvalidContext { .. }
            | SyncError::ResourceLookupFailed { .. } => AppError::Unprocessable(err.to_string()),
            SyncError::RemoteUploadFailed(_)
            | SyncError::RemoteDeleteFailed(_)
            | SyncError::Remote(_) => AppError::BadGateway(err.to_string()),
            SyncError::Metadata(e) => AppError::Database(e),
            SyncError::Io(_) | SyncError::Config(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::BadGateway(msg) => {
                tracing::error!("Remote storage error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "errors": [{ "title": message }]
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_status_mapping() {
        let cases = [
            (
                SyncError::UnsupportedDocumentType("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                SyncError::ResourceLookupFailed {
                    resource: "case",
                    id: "c1".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (SyncError::NotFound("f1".into()), StatusCode::NOT_FOUND),
            (
                SyncError::RemoteUploadFailed("boom".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                SyncError::NoActiveSession("share://a".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                SyncError::Config("bad".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
