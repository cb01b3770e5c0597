use crate::AppState;
use crate::api::error::AppError;
use crate::models::{
    DocumentContext, DocumentType, FileLinkage, FileMetadataEntry, LinkTarget, SessionHandle,
};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct FileResourceData {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: FileMetadataEntry,
}

#[derive(Serialize, ToSchema)]
pub struct FileResource {
    pub data: FileResourceData,
}

impl From<FileMetadataEntry> for FileResource {
    fn from(entry: FileMetadataEntry) -> Self {
        FileResource {
            data: FileResourceData {
                id: entry.id.clone(),
                resource_type: "files".to_string(),
                attributes: entry,
            },
        }
    }
}

/// Strips any client-side directory. The name itself is kept as sent.
fn attachment_name(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).to_string()
}

#[utoipa::path(
    post,
    path = "/cases/{case_id}/attachments",
    params(
        ("case_id" = String, Path, description = "Case the attachment belongs to")
    ),
    request_body(content = Multipart, description = "Attachment in the `file` field"),
    responses(
        (status = 201, description = "Attachment uploaded", body = FileResource),
        (status = 400, description = "Missing file or session header"),
        (status = 401, description = "Unknown or expired session"),
        (status = 422, description = "Case not found"),
        (status = 502, description = "Remote storage failure")
    ),
    tag = "files"
)]
pub async fn upload_case_attachment(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(case_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(attachment_name)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::BadRequest("File name missing".to_string()))?;
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((file_name, content));
    }

    let (file_name, content) =
        upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let size = content.len() as u64;

    tracing::info!(case_id = %case_id, file = %file_name, size, "Uploading case attachment");

    let entry = state
        .orchestrator
        .upload(
            DocumentType::CaseAttachment,
            &DocumentContext::Case {
                case_id: case_id.clone(),
                file_name,
            },
            FileLinkage::new(LinkTarget::Case(case_id), DocumentType::CaseAttachment),
            content,
            size,
            &session,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(FileResource::from(entry))))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unknown or expired session"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.orchestrator.delete(&file_id, &session).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/files/{id}/download",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "Temporary download URL in the Location header"),
        (status = 401, description = "Unknown or expired session"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn download_link(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let url = state.orchestrator.download_url(&file_id, &session).await?;
    Ok((StatusCode::NO_CONTENT, [(header::LOCATION, url)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_name_drops_client_path() {
        assert_eq!(attachment_name("C:\\Users\\me\\scan.pdf"), "scan.pdf");
        assert_eq!(attachment_name("dir/photo|1.jpg"), "photo|1.jpg");
        assert_eq!(attachment_name("scan (1).pdf"), "scan (1).pdf");
        assert_eq!(attachment_name("uploads/"), "");
    }
}
