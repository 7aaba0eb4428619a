//! Voice Token Handler
//!
//! Errors on this endpoint use the media client's `{"error": "..."}` shape
//! rather than the API error body.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::dto::request::VoiceTokenQuery;
use crate::application::dto::response::VoiceTokenResponse;
use crate::application::services::VoiceError;
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Mint a media-room token for the server's voice room
pub async fn voice_token(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<VoiceTokenQuery>,
) -> Result<Json<VoiceTokenResponse>, Response> {
    let server_id = query
        .server_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| error_body(StatusCode::BAD_REQUEST, "Missing serverId"))?;

    match state.voice.issue_token(&current.user, server_id).await {
        Ok(token) => Ok(Json(VoiceTokenResponse { token })),
        Err(VoiceError::NotConfigured) => {
            tracing::error!("Voice token requested but credentials are not configured");
            Err(error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server misconfigured",
            ))
        }
        Err(e) => Err(AppError::from(e).into_response()),
    }
}
