//! Direct Message Service
//!
//! Two-party conversations between users.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::application::dto::response::{DirectMessageResponse, UserResponse};
use crate::domain::services::{AccessError, AccessGuard};
use crate::domain::{
    ConversationTarget, DirectMessage, DirectMessageRepository, User, UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Direct message service trait
#[async_trait]
pub trait DirectMessageService: Send + Sync {
    /// Conversations of the caller, each with the other participant.
    async fn list(&self, user_id: i64) -> Result<Vec<DirectMessageResponse>, DirectMessageError>;

    /// One conversation, members only.
    async fn get(
        &self,
        user_id: i64,
        direct_message_id: i64,
    ) -> Result<DirectMessageResponse, DirectMessageError>;

    /// Find or create the conversation between the caller and `other_id`.
    async fn open(
        &self,
        user_id: i64,
        other_id: i64,
    ) -> Result<DirectMessageResponse, DirectMessageError>;
}

/// Direct message service errors
#[derive(Debug, thiserror::Error)]
pub enum DirectMessageError {
    #[error("User not found")]
    UserNotFound,

    #[error("You cannot start a conversation with yourself")]
    SelfConversation,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<DirectMessageError> for AppError {
    fn from(err: DirectMessageError) -> Self {
        match err {
            DirectMessageError::UserNotFound => AppError::NotFound(err.to_string()),
            DirectMessageError::SelfConversation => AppError::InvalidInput(err.to_string()),
            DirectMessageError::Access(e) => e.into(),
            DirectMessageError::Store(e) => e,
        }
    }
}

/// DirectMessageService implementation
pub struct DirectMessageServiceImpl {
    dm_repo: Arc<dyn DirectMessageRepository>,
    user_repo: Arc<dyn UserRepository>,
    guard: AccessGuard,
    id_generator: Arc<SnowflakeGenerator>,
}

impl DirectMessageServiceImpl {
    pub fn new(
        dm_repo: Arc<dyn DirectMessageRepository>,
        user_repo: Arc<dyn UserRepository>,
        guard: AccessGuard,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            dm_repo,
            user_repo,
            guard,
            id_generator,
        }
    }

    /// Attach the participant that is not `user_id`. A deleted account is
    /// rendered as a placeholder.
    async fn with_other_member(
        &self,
        user_id: i64,
        dm: DirectMessage,
    ) -> Result<Option<DirectMessageResponse>, AppError> {
        let members = self.dm_repo.find_members(dm.id).await?;
        let Some(other_id) = members.into_iter().find(|id| *id != user_id) else {
            return Ok(None);
        };
        let other = self
            .user_repo
            .find_by_id(other_id)
            .await?
            .unwrap_or_else(|| User::deleted(other_id));

        Ok(Some(DirectMessageResponse {
            id: dm.id.to_string(),
            user: UserResponse::from_user(other, false),
            created_at: dm.created_at.to_rfc3339(),
        }))
    }
}

#[async_trait]
impl DirectMessageService for DirectMessageServiceImpl {
    async fn list(&self, user_id: i64) -> Result<Vec<DirectMessageResponse>, DirectMessageError> {
        let dms = self.dm_repo.find_by_user(user_id).await?;

        let mut responses = Vec::with_capacity(dms.len());
        for dm in dms {
            if let Some(response) = self.with_other_member(user_id, dm).await? {
                responses.push(response);
            }
        }
        Ok(responses)
    }

    async fn get(
        &self,
        user_id: i64,
        direct_message_id: i64,
    ) -> Result<DirectMessageResponse, DirectMessageError> {
        self.guard
            .assert_conversation_member(
                user_id,
                ConversationTarget::DirectMessage(direct_message_id),
            )
            .await?;

        let dm = self
            .dm_repo
            .find_by_id(direct_message_id)
            .await?
            .ok_or(AccessError::DirectMessageNotFound)?;

        self.with_other_member(user_id, dm)
            .await?
            .ok_or(DirectMessageError::Access(AccessError::DirectMessageNotFound))
    }

    #[instrument(skip(self))]
    async fn open(
        &self,
        user_id: i64,
        other_id: i64,
    ) -> Result<DirectMessageResponse, DirectMessageError> {
        if user_id == other_id {
            return Err(DirectMessageError::SelfConversation);
        }

        let other = self
            .user_repo
            .find_by_id(other_id)
            .await?
            .ok_or(DirectMessageError::UserNotFound)?;

        let dm = self
            .dm_repo
            .find_or_create_between(self.id_generator.generate(), user_id, other_id)
            .await?;

        Ok(DirectMessageResponse {
            id: dm.id.to_string(),
            user: UserResponse::from_user(other, false),
            created_at: dm.created_at.to_rfc3339(),
        })
    }
}
