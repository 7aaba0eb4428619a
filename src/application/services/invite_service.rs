//! Invite Service
//!
//! Server invites with optional expiry and use limits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::application::dto::response::{
    InvitePreviewResponse, InviteResponse, JoinInviteResponse, ServerResponse,
};
use crate::domain::services::{AccessError, AccessGuard};
use crate::domain::traits::FileStorage;
use crate::domain::{Invite, InviteRedemption, InviteRepository, ServerRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Invite service trait
#[async_trait]
pub trait InviteService: Send + Sync {
    /// Public invite preview; fails for invalid invites.
    async fn get(&self, invite_id: i64) -> Result<InvitePreviewResponse, InviteError>;

    /// Create an invite to a server the caller belongs to.
    async fn create(
        &self,
        user_id: i64,
        server_id: i64,
        request: CreateInviteDto,
    ) -> Result<i64, InviteError>;

    /// Join the invite's server.
    async fn join(&self, user_id: i64, invite_id: i64) -> Result<JoinInviteResponse, InviteError>;
}

/// Create invite request
#[derive(Debug, Clone, Default)]
pub struct CreateInviteDto {
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
}

/// Invite service errors
#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("Invite not found")]
    NotFound,

    #[error("Server not found")]
    ServerNotFound,

    #[error("Invite has expired")]
    Expired,

    #[error("Invite has reached its maximum uses")]
    MaxUsesReached,

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<InviteError> for AppError {
    fn from(err: InviteError) -> Self {
        match err {
            InviteError::NotFound | InviteError::ServerNotFound => {
                AppError::NotFound(err.to_string())
            }
            InviteError::Expired | InviteError::MaxUsesReached | InviteError::InvalidInput(_) => {
                AppError::InvalidInput(err.to_string())
            }
            InviteError::Access(e) => e.into(),
            InviteError::Store(e) => e,
        }
    }
}

/// Check that an invite can still be used at `now`.
pub fn ensure_usable(invite: &Invite, now: DateTime<Utc>) -> Result<(), InviteError> {
    if invite.is_expired_at(now) {
        return Err(InviteError::Expired);
    }
    if invite.is_maxed_out() {
        return Err(InviteError::MaxUsesReached);
    }
    Ok(())
}

/// InviteService implementation
pub struct InviteServiceImpl {
    invite_repo: Arc<dyn InviteRepository>,
    server_repo: Arc<dyn ServerRepository>,
    files: Arc<dyn FileStorage>,
    guard: AccessGuard,
    id_generator: Arc<SnowflakeGenerator>,
}

impl InviteServiceImpl {
    pub fn new(
        invite_repo: Arc<dyn InviteRepository>,
        server_repo: Arc<dyn ServerRepository>,
        files: Arc<dyn FileStorage>,
        guard: AccessGuard,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            invite_repo,
            server_repo,
            files,
            guard,
            id_generator,
        }
    }

    async fn find_usable(&self, invite_id: i64) -> Result<Invite, InviteError> {
        let invite = self
            .invite_repo
            .find_by_id(invite_id)
            .await?
            .ok_or(InviteError::NotFound)?;
        ensure_usable(&invite, Utc::now())?;
        Ok(invite)
    }
}

#[async_trait]
impl InviteService for InviteServiceImpl {
    async fn get(&self, invite_id: i64) -> Result<InvitePreviewResponse, InviteError> {
        let invite = self.find_usable(invite_id).await?;
        let server = self
            .server_repo
            .find_by_id(invite.server_id)
            .await?
            .ok_or(InviteError::ServerNotFound)?;

        let icon_url = match server.icon_id.as_deref() {
            Some(icon_id) => self.files.get_url(icon_id).await?,
            None => None,
        };

        Ok(InvitePreviewResponse {
            invite: InviteResponse::from(invite),
            server: ServerResponse::from_server(server, icon_url),
        })
    }

    #[instrument(skip(self, request))]
    async fn create(
        &self,
        user_id: i64,
        server_id: i64,
        request: CreateInviteDto,
    ) -> Result<i64, InviteError> {
        self.guard.assert_server_member(user_id, server_id).await?;

        let now = Utc::now();
        if matches!(request.max_uses, Some(max) if max < 1) {
            return Err(InviteError::InvalidInput(
                "max_uses must be at least 1".into(),
            ));
        }
        if matches!(request.expires_at, Some(at) if at <= now) {
            return Err(InviteError::InvalidInput(
                "expires_at must be in the future".into(),
            ));
        }

        let invite = Invite {
            id: self.id_generator.generate(),
            server_id,
            expires_at: request.expires_at,
            max_uses: request.max_uses,
            uses: 0,
            created_at: now,
        };
        let created = self.invite_repo.create(&invite).await?;

        info!(invite_id = created.id, server_id, "Invite created");
        Ok(created.id)
    }

    #[instrument(skip(self))]
    async fn join(&self, user_id: i64, invite_id: i64) -> Result<JoinInviteResponse, InviteError> {
        let invite = self.find_usable(invite_id).await?;

        let joined = match self
            .invite_repo
            .redeem(invite.id, user_id, Utc::now())
            .await?
        {
            InviteRedemption::Joined => true,
            InviteRedemption::AlreadyMember => false,
            // Another join took the last use, or the invite expired meanwhile
            InviteRedemption::Unavailable => return Err(InviteError::MaxUsesReached),
        };

        if joined {
            info!(server_id = invite.server_id, "User joined server via invite");
        }

        Ok(JoinInviteResponse {
            server_id: invite.server_id.to_string(),
            joined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_ensure_usable_reports_reason() {
        let now = Utc::now();
        let mut invite = Invite {
            id: 1,
            server_id: 1,
            expires_at: None,
            max_uses: Some(1),
            uses: 0,
            created_at: now,
        };
        assert!(ensure_usable(&invite, now).is_ok());

        invite.uses = 1;
        assert!(matches!(
            ensure_usable(&invite, now),
            Err(InviteError::MaxUsesReached)
        ));

        invite.uses = 0;
        invite.expires_at = Some(now - Duration::minutes(1));
        assert!(matches!(ensure_usable(&invite, now), Err(InviteError::Expired)));
    }
}
