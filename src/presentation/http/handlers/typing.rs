//! Typing Indicator Handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{TargetQuery, TypingRequest};
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Mark the current user as typing
pub async fn start_typing(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<TypingRequest>,
) -> Result<StatusCode, AppError> {
    state.typing.upsert(current.id(), body.target).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Usernames of others typing in a conversation
pub async fn get_typing(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<TargetQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let target = query.target()?;
    Ok(Json(state.typing.list(current.id(), target).await?))
}
