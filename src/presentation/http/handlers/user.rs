//! User Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    AdminDirectMessageRequest, SetEmailRequest, SetPrivacyRequest,
};
use crate::application::dto::response::{IdResponse, IsAdminResponse, UserResponse};
use crate::domain::User;
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, validation_error};
use crate::startup::AppState;

/// Email is visible to the account itself and to admins.
fn render(users: Vec<User>, viewer: &User) -> Vec<UserResponse> {
    users
        .into_iter()
        .map(|u| {
            let include_email = viewer.is_admin() || u.id == viewer.id;
            UserResponse::from_user(u, include_email)
        })
        .collect()
}

/// Get the current user
pub async fn get_current_user(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_user(current.user, true))
}

/// Whether the current user is an admin
pub async fn is_admin(current: CurrentUser) -> Json<IsAdminResponse> {
    Json(IsAdminResponse {
        is_admin: current.user.is_admin(),
    })
}

/// List every user (admin only)
pub async fn list_all(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list_all(&current.user).await?;
    Ok(Json(render(users, &current.user)))
}

/// List users that are not private
pub async fn list_public(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list_public().await?;
    Ok(Json(render(users, &current.user)))
}

/// List private users (admin only)
pub async fn list_private(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list_private(&current.user).await?;
    Ok(Json(render(users, &current.user)))
}

/// Public users plus the caller
pub async fn list_visible(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list_visible(&current.user).await?;
    Ok(Json(render(users, &current.user)))
}

/// Set the current user's privacy flag
pub async fn set_privacy(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<SetPrivacyRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .set_privacy(&current.user, body.is_private)
        .await?;
    Ok(Json(UserResponse::from_user(user, true)))
}

/// Copy the token's email claim into the profile
pub async fn sync_email(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .sync_email(&current.user, current.identity.email.as_deref())
        .await?;
    Ok(Json(UserResponse::from_user(user, true)))
}

/// Set another user's email (admin only)
pub async fn set_email(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
    Json(body): Json<SetEmailRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = parse_id(&user_id, "user")?;
    body.validate().map_err(validation_error)?;

    let user = state
        .users
        .set_email(&current.user, user_id, &body.email)
        .await?;
    Ok(Json(UserResponse::from_user(user, true)))
}

/// Send a direct message on behalf of an admin
pub async fn admin_send_direct_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<AdminDirectMessageRequest>,
) -> Result<(StatusCode, Json<IdResponse>), AppError> {
    body.validate().map_err(validation_error)?;
    let target_user_id = parse_id(&body.user_id, "user")?;

    let message_id = state
        .users
        .admin_send_direct_message(&current.user, target_user_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(IdResponse::new(message_id))))
}
