//! Server Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::{
    CreateChannelRequest, CreateInviteRequest, CreateServerRequest,
};
use crate::application::dto::response::{
    ChannelResponse, CreatedServerResponse, IdResponse, ServerResponse, UserResponse,
};
use crate::application::services::{CreateInviteDto, CreateServerDto};
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::shared::validation::{parse_id, validation_error};
use crate::startup::AppState;

/// Servers the current user belongs to
pub async fn list_servers(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<ServerResponse>>, AppError> {
    Ok(Json(state.servers.list(current.id()).await?))
}

/// Create a server with its default channel
pub async fn create_server(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateServerRequest>,
) -> Result<(StatusCode, Json<CreatedServerResponse>), AppError> {
    body.validate().map_err(validation_error)?;

    let created = state
        .servers
        .create(
            current.id(),
            CreateServerDto {
                name: body.name,
                icon_id: body.icon_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a server
pub async fn get_server(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(server_id): Path<String>,
) -> Result<Json<ServerResponse>, AppError> {
    let server_id = parse_id(&server_id, "server")?;
    Ok(Json(state.servers.get(current.id(), server_id).await?))
}

/// Delete a server and everything in it
pub async fn delete_server(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(server_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let server_id = parse_id(&server_id, "server")?;
    state.servers.remove(current.id(), server_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Members of a server
pub async fn get_server_members(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(server_id): Path<String>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let server_id = parse_id(&server_id, "server")?;
    Ok(Json(state.servers.members(current.id(), server_id).await?))
}

/// Channels of a server
pub async fn get_server_channels(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(server_id): Path<String>,
) -> Result<Json<Vec<ChannelResponse>>, AppError> {
    let server_id = parse_id(&server_id, "server")?;
    Ok(Json(state.channels.list(current.id(), server_id).await?))
}

/// Create a channel (owner only)
pub async fn create_channel(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(server_id): Path<String>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<IdResponse>), AppError> {
    let server_id = parse_id(&server_id, "server")?;

    let channel_id = state
        .channels
        .create(current.id(), server_id, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(IdResponse::new(channel_id))))
}

/// Create an invite (members only)
pub async fn create_invite(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(server_id): Path<String>,
    body: Option<Json<CreateInviteRequest>>,
) -> Result<(StatusCode, Json<IdResponse>), AppError> {
    let server_id = parse_id(&server_id, "server")?;
    let Json(body) = body.unwrap_or_default();

    let invite_id = state
        .invites
        .create(
            current.id(),
            server_id,
            CreateInviteDto {
                expires_at: body.expires_at,
                max_uses: body.max_uses,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(IdResponse::new(invite_id))))
}
