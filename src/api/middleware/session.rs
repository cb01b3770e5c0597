use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub const SESSION_HEADER: &str = "mu-session-id";

/// Resolves the `mu-session-id` header into a `SessionHandle` extension.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", SESSION_HEADER)))?;

    let session = state
        .sessions
        .get_session(&session_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown or expired session".to_string()))?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
