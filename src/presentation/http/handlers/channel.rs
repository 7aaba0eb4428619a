//! Channel Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::response::ChannelResponse;
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::shared::validation::parse_id;
use crate::startup::AppState;

/// Get channel by ID
pub async fn get_channel(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    Ok(Json(state.channels.get(current.id(), channel_id).await?))
}

/// Delete channel (owner only; never the default channel)
pub async fn delete_channel(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    state.channels.remove(current.id(), channel_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
