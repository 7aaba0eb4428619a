//! Invite Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::dto::response::{InvitePreviewResponse, JoinInviteResponse};
use crate::presentation::http::extractors::CurrentUser;
use crate::shared::error::AppError;
use crate::shared::validation::parse_id;
use crate::startup::AppState;

/// Preview an invite. No authentication required.
pub async fn get_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<String>,
) -> Result<Json<InvitePreviewResponse>, AppError> {
    let invite_id = parse_id(&invite_id, "invite")?;
    Ok(Json(state.invites.get(invite_id).await?))
}

/// Join the invite's server
pub async fn join_invite(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(invite_id): Path<String>,
) -> Result<Json<JoinInviteResponse>, AppError> {
    let invite_id = parse_id(&invite_id, "invite")?;
    Ok(Json(state.invites.join(current.id(), invite_id).await?))
}
