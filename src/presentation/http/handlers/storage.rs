//! File Storage Handlers
//!
//! Clients ask for a signed upload URL, `PUT` the raw bytes to it and get
//! back a storage id they can attach to messages or server icons.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::application::dto::response::{StoredFileResponse, UploadUrlResponse};
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Issue a single-use upload location
pub async fn generate_upload_url(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UploadUrlResponse>, AppError> {
    let upload = state.files.generate_upload_url(current.id()).await?;
    Ok(Json(UploadUrlResponse {
        url: upload.url,
        expires_at: upload.expires_at.to_rfc3339(),
    }))
}

/// Receive the bytes for an upload ticket
pub async fn upload(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredFileResponse>), AppError> {
    if body.is_empty() {
        return Err(AppError::InvalidInput("Upload body is empty".into()));
    }

    let storage_id = state.files.store(&ticket, body.to_vec()).await?;
    tracing::debug!(storage_id = %storage_id, "File stored");
    Ok((StatusCode::CREATED, Json(StoredFileResponse { storage_id })))
}

/// Serve a stored file
pub async fn get_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state
        .files
        .read(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
