//! Message Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{CreateMessageRequest, TargetQuery};
use crate::application::dto::response::{IdResponse, MessageResponse};
use crate::application::services::CreateMessageDto;
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::shared::validation::parse_id;
use crate::startup::AppState;

/// Messages of a conversation, oldest first
pub async fn get_messages(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<TargetQuery>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let target = query.target()?;
    Ok(Json(state.messages.list(current.id(), target).await?))
}

/// Send a message. Typing cleanup and moderation run in the background.
///
/// Content limits are checked by the service after the membership guard.
pub async fn send_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<IdResponse>), AppError> {
    let created = state
        .messages
        .create(
            current.id(),
            CreateMessageDto {
                target: body.target,
                content: body.content,
                attachment_id: body.attachment_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(IdResponse::new(created.message.id))))
}

/// Delete a message (author only)
pub async fn delete_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(message_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let message_id = parse_id(&message_id, "message")?;
    state.messages.remove(current.id(), message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
