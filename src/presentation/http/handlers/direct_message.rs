//! Direct Message Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::dto::request::OpenDirectMessageRequest;
use crate::application::dto::response::DirectMessageResponse;
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::shared::validation::parse_id;
use crate::startup::AppState;

/// Conversations of the current user
pub async fn list_direct_messages(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<DirectMessageResponse>>, AppError> {
    Ok(Json(state.direct_messages.list(current.id()).await?))
}

/// Get one conversation
pub async fn get_direct_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(direct_message_id): Path<String>,
) -> Result<Json<DirectMessageResponse>, AppError> {
    let direct_message_id = parse_id(&direct_message_id, "direct message")?;
    Ok(Json(
        state
            .direct_messages
            .get(current.id(), direct_message_id)
            .await?,
    ))
}

/// Find or create the conversation with another user
pub async fn open_direct_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<OpenDirectMessageRequest>,
) -> Result<Json<DirectMessageResponse>, AppError> {
    let other_id = parse_id(&body.user_id, "user")?;
    Ok(Json(
        state.direct_messages.open(current.id(), other_id).await?,
    ))
}
