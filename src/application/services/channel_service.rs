//! Channel Service
//!
//! Handles channel management operations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::dto::response::ChannelResponse;
use crate::domain::services::{AccessError, AccessGuard};
use crate::domain::traits::FileStorage;
use crate::domain::{Channel, ChannelRepository, ConversationTarget, TypingRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Longest accepted channel name, in characters.
pub const MAX_CHANNEL_NAME_LENGTH: usize = 100;

/// Channel service trait
#[async_trait]
pub trait ChannelService: Send + Sync {
    /// Get channel by ID, members only.
    async fn get(&self, user_id: i64, channel_id: i64) -> Result<ChannelResponse, ChannelError>;

    /// Channels of a server, members only.
    async fn list(&self, user_id: i64, server_id: i64)
        -> Result<Vec<ChannelResponse>, ChannelError>;

    /// Create a channel, owner only. Returns the new channel id.
    async fn create(&self, user_id: i64, server_id: i64, name: &str)
        -> Result<i64, ChannelError>;

    /// Delete a non-default channel and its messages, owner only.
    async fn remove(&self, user_id: i64, channel_id: i64) -> Result<(), ChannelError>;
}

/// Channel service errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel not found")]
    NotFound,

    #[error("Channel already exists")]
    AlreadyExists,

    #[error("Channel name cannot be empty")]
    EmptyName,

    #[error("Channel name exceeds 100 characters")]
    NameTooLong,

    #[error("You cannot delete the default channel")]
    DefaultChannel,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<ChannelError> for AppError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotFound => AppError::NotFound(err.to_string()),
            ChannelError::AlreadyExists => AppError::AlreadyExists(err.to_string()),
            ChannelError::EmptyName | ChannelError::NameTooLong => {
                AppError::InvalidInput(err.to_string())
            }
            ChannelError::DefaultChannel => AppError::Forbidden(err.to_string()),
            ChannelError::Access(e) => e.into(),
            ChannelError::Store(e) => e,
        }
    }
}

/// ChannelService implementation
pub struct ChannelServiceImpl {
    channel_repo: Arc<dyn ChannelRepository>,
    typing_repo: Arc<dyn TypingRepository>,
    files: Arc<dyn FileStorage>,
    guard: AccessGuard,
    id_generator: Arc<SnowflakeGenerator>,
}

impl ChannelServiceImpl {
    pub fn new(
        channel_repo: Arc<dyn ChannelRepository>,
        typing_repo: Arc<dyn TypingRepository>,
        files: Arc<dyn FileStorage>,
        guard: AccessGuard,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            channel_repo,
            typing_repo,
            files,
            guard,
            id_generator,
        }
    }

    async fn find(&self, channel_id: i64) -> Result<Channel, ChannelError> {
        self.channel_repo
            .find_by_id(channel_id)
            .await?
            .ok_or(ChannelError::NotFound)
    }
}

#[async_trait]
impl ChannelService for ChannelServiceImpl {
    async fn get(&self, user_id: i64, channel_id: i64) -> Result<ChannelResponse, ChannelError> {
        let channel = self.find(channel_id).await?;
        self.guard
            .assert_server_member(user_id, channel.server_id)
            .await?;
        Ok(ChannelResponse::from(channel))
    }

    async fn list(
        &self,
        user_id: i64,
        server_id: i64,
    ) -> Result<Vec<ChannelResponse>, ChannelError> {
        self.guard.assert_server_member(user_id, server_id).await?;

        let channels = self.channel_repo.find_by_server(server_id).await?;
        Ok(channels.into_iter().map(ChannelResponse::from).collect())
    }

    async fn create(
        &self,
        user_id: i64,
        server_id: i64,
        name: &str,
    ) -> Result<i64, ChannelError> {
        self.guard.assert_server_owner(user_id, server_id).await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ChannelError::EmptyName);
        }
        if name.chars().count() > MAX_CHANNEL_NAME_LENGTH {
            return Err(ChannelError::NameTooLong);
        }

        if self
            .channel_repo
            .find_by_server_and_name(server_id, name)
            .await?
            .is_some()
        {
            return Err(ChannelError::AlreadyExists);
        }

        let channel = Channel::new(self.id_generator.generate(), server_id, name);
        let created = self
            .channel_repo
            .create(&channel)
            .await
            .map_err(|e| match e {
                // Unique index caught a concurrent create
                AppError::AlreadyExists(_) => ChannelError::AlreadyExists,
                other => ChannelError::Store(other),
            })?;

        info!(channel_id = created.id, server_id, "Channel created");
        Ok(created.id)
    }

    async fn remove(&self, user_id: i64, channel_id: i64) -> Result<(), ChannelError> {
        let channel = self.find(channel_id).await?;
        let server = self
            .guard
            .assert_server_owner(user_id, channel.server_id)
            .await?;

        if server.is_default_channel(channel.id) {
            return Err(ChannelError::DefaultChannel);
        }

        let attachment_ids = self.channel_repo.delete_cascade(channel.id).await?;

        if let Err(e) = self
            .typing_repo
            .clear_target(ConversationTarget::Channel(channel.id))
            .await
        {
            warn!(channel_id, error = %e, "Failed to clear typing indicators");
        }
        for file_id in &attachment_ids {
            if let Err(e) = self.files.delete(file_id).await {
                warn!(file_id = %file_id, error = %e, "Failed to delete attachment");
            }
        }

        info!(channel_id, server_id = channel.server_id, "Channel deleted");
        Ok(())
    }
}
