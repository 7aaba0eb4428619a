//! Voice Service
//!
//! Issues media-room access tokens for a server's voice room.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::domain::services::{AccessError, AccessGuard};
use crate::domain::traits::{VoiceGrant, VoiceTokenMinter};
use crate::domain::User;
use crate::shared::error::AppError;

/// Voice service trait
#[async_trait]
pub trait VoiceService: Send + Sync {
    /// Token that lets `user` join the room of `server_id`.
    async fn issue_token(&self, user: &User, server_id: i64) -> Result<String, VoiceError>;
}

/// Voice service errors
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("Voice credentials are not configured")]
    NotConfigured,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<VoiceError> for AppError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::NotConfigured => AppError::Internal(err.to_string()),
            VoiceError::Access(e) => e.into(),
            VoiceError::Store(e) => e,
        }
    }
}

/// VoiceService implementation
pub struct VoiceServiceImpl {
    minter: Option<Arc<dyn VoiceTokenMinter>>,
    guard: AccessGuard,
}

impl VoiceServiceImpl {
    /// `minter` is `None` when the media provider keys are missing.
    pub fn new(minter: Option<Arc<dyn VoiceTokenMinter>>, guard: AccessGuard) -> Self {
        Self { minter, guard }
    }
}

#[async_trait]
impl VoiceService for VoiceServiceImpl {
    #[instrument(skip(self, user), fields(user_id = user.id))]
    async fn issue_token(&self, user: &User, server_id: i64) -> Result<String, VoiceError> {
        let minter = self.minter.as_ref().ok_or(VoiceError::NotConfigured)?;

        self.guard.assert_server_member(user.id, server_id).await?;

        let grant = VoiceGrant {
            identity: user.id.to_string(),
            name: user.username.clone(),
            room: server_id.to_string(),
        };
        Ok(minter.mint(&grant)?)
    }
}
