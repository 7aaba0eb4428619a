//! Friend Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{FriendRequestRequest, UpdateFriendStatusRequest};
use crate::application::dto::response::FriendResponse;
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, validation_error};
use crate::startup::AppState;

/// Accepted friends of the current user
pub async fn list_friends(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<FriendResponse>>, AppError> {
    Ok(Json(state.friends.list_accepted(current.id()).await?))
}

/// Incoming pending requests
pub async fn list_pending(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<FriendResponse>>, AppError> {
    Ok(Json(state.friends.list_pending(current.id()).await?))
}

/// Send a friend request by username
pub async fn send_request(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<FriendRequestRequest>,
) -> Result<(StatusCode, Json<FriendResponse>), AppError> {
    body.validate().map_err(validation_error)?;
    let friend = state
        .friends
        .request(current.id(), body.username.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(friend)))
}

/// Accept, reject or reopen a request
pub async fn update_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(friend_id): Path<String>,
    Json(body): Json<UpdateFriendStatusRequest>,
) -> Result<StatusCode, AppError> {
    let friend_id = parse_id(&friend_id, "friend")?;
    state
        .friends
        .update_status(current.id(), friend_id, body.status)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
