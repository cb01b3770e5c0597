pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers;
use crate::api::middleware::{request_id::request_id_middleware, session::session_middleware};
use crate::services::session::SessionProvider;
use crate::services::storage::RemoteStorage;
use crate::services::upload::UploadOrchestrator;
use axum::{
    Json, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::files::upload_case_attachment,
        handlers::files::delete_file,
        handlers::files::download_link,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::files::FileResource,
            handlers::files::FileResourceData,
            models::FileMetadataEntry,
            models::DocumentType,
        )
    ),
    tags(
        (name = "system", description = "Service status"),
        (name = "files", description = "Document upload and management")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub orchestrator: Arc<UploadOrchestrator>,
    pub sessions: Arc<dyn SessionProvider>,
    pub remote: Arc<dyn RemoteStorage>,
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_app(state: AppState) -> Router {
    let session_routes = Router::new()
        .route(
            "/cases/:case_id/attachments",
            post(handlers::files::upload_case_attachment),
        )
        .route("/files/:id", delete(handlers::files::delete_file))
        .route("/files/:id/download", get(handlers::files::download_link))
        .layer(from_fn_with_state(state.clone(), session_middleware));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(session_routes)
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
