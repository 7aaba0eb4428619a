//! Server Service
//!
//! Handles server management: listing, creation with a default channel, and
//! cascading deletion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::application::dto::response::{CreatedServerResponse, ServerResponse, UserResponse};
use crate::domain::services::{AccessError, AccessGuard};
use crate::domain::traits::FileStorage;
use crate::domain::{
    Channel, ConversationTarget, MemberRepository, Server, ServerRepository, TypingRepository,
    UserRepository, DEFAULT_CHANNEL_NAME,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Server service trait
#[async_trait]
pub trait ServerService: Send + Sync {
    /// Servers the caller is a member of.
    async fn list(&self, user_id: i64) -> Result<Vec<ServerResponse>, ServerError>;

    /// Get a server, members only.
    async fn get(&self, user_id: i64, server_id: i64) -> Result<ServerResponse, ServerError>;

    /// User records of all members, members only.
    async fn members(&self, user_id: i64, server_id: i64)
        -> Result<Vec<UserResponse>, ServerError>;

    /// Create a server owned by the caller.
    async fn create(
        &self,
        owner_id: i64,
        request: CreateServerDto,
    ) -> Result<CreatedServerResponse, ServerError>;

    /// Delete a server and everything in it, owner only.
    async fn remove(&self, user_id: i64, server_id: i64) -> Result<(), ServerError>;
}

/// Create server request
#[derive(Debug, Clone)]
pub struct CreateServerDto {
    pub name: String,
    pub icon_id: Option<String>,
}

/// Server service errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Server not found")]
    NotFound,

    #[error("Server name cannot be empty")]
    EmptyName,

    #[error("Icon is not an unused upload of yours")]
    InvalidIcon,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<ServerError> for AppError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::NotFound => AppError::NotFound(err.to_string()),
            ServerError::EmptyName | ServerError::InvalidIcon => {
                AppError::InvalidInput(err.to_string())
            }
            ServerError::Access(e) => e.into(),
            ServerError::Store(e) => e,
        }
    }
}

/// ServerService implementation
pub struct ServerServiceImpl {
    server_repo: Arc<dyn ServerRepository>,
    member_repo: Arc<dyn MemberRepository>,
    user_repo: Arc<dyn UserRepository>,
    typing_repo: Arc<dyn TypingRepository>,
    files: Arc<dyn FileStorage>,
    guard: AccessGuard,
    id_generator: Arc<SnowflakeGenerator>,
}

impl ServerServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        server_repo: Arc<dyn ServerRepository>,
        member_repo: Arc<dyn MemberRepository>,
        user_repo: Arc<dyn UserRepository>,
        typing_repo: Arc<dyn TypingRepository>,
        files: Arc<dyn FileStorage>,
        guard: AccessGuard,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            server_repo,
            member_repo,
            user_repo,
            typing_repo,
            files,
            guard,
            id_generator,
        }
    }

    async fn to_response(&self, server: Server) -> Result<ServerResponse, AppError> {
        let icon_url = match server.icon_id.as_deref() {
            Some(icon_id) => self.files.get_url(icon_id).await?,
            None => None,
        };
        Ok(ServerResponse::from_server(server, icon_url))
    }
}

#[async_trait]
impl ServerService for ServerServiceImpl {
    async fn list(&self, user_id: i64) -> Result<Vec<ServerResponse>, ServerError> {
        let servers = self.server_repo.find_by_member(user_id).await?;

        let mut responses = Vec::with_capacity(servers.len());
        for server in servers {
            responses.push(self.to_response(server).await?);
        }
        Ok(responses)
    }

    async fn get(&self, user_id: i64, server_id: i64) -> Result<ServerResponse, ServerError> {
        self.guard.assert_server_member(user_id, server_id).await?;

        let server = self
            .server_repo
            .find_by_id(server_id)
            .await?
            .ok_or(ServerError::NotFound)?;

        Ok(self.to_response(server).await?)
    }

    async fn members(
        &self,
        user_id: i64,
        server_id: i64,
    ) -> Result<Vec<UserResponse>, ServerError> {
        self.guard.assert_server_member(user_id, server_id).await?;

        let user_ids: Vec<i64> = self
            .member_repo
            .find_by_server(server_id)
            .await?
            .into_iter()
            .map(|m| m.user_id)
            .collect();

        let users = self.user_repo.find_by_ids(&user_ids).await?;
        Ok(users
            .into_iter()
            .map(|u| UserResponse::from_user(u, false))
            .collect())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create(
        &self,
        owner_id: i64,
        request: CreateServerDto,
    ) -> Result<CreatedServerResponse, ServerError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServerError::EmptyName);
        }
        if let Some(icon_id) = request.icon_id.as_deref() {
            if !self.files.claim(icon_id, owner_id).await? {
                return Err(ServerError::InvalidIcon);
            }
        }

        let server_id = self.id_generator.generate();
        let channel = Channel::new(self.id_generator.generate(), server_id, DEFAULT_CHANNEL_NAME);
        let server = Server {
            id: server_id,
            name: name.to_string(),
            owner_id,
            icon_id: request.icon_id,
            default_channel_id: Some(channel.id),
            created_at: Utc::now(),
        };

        let created = self
            .server_repo
            .create_with_default_channel(&server, &channel)
            .await?;

        info!(server_id = created.id, owner_id, "Server created");

        Ok(CreatedServerResponse {
            server_id: created.id.to_string(),
            default_channel_id: channel.id.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, user_id: i64, server_id: i64) -> Result<(), ServerError> {
        self.guard.assert_server_owner(user_id, server_id).await?;

        let removal = self.server_repo.delete_cascade(server_id).await?;

        for channel_id in &removal.channel_ids {
            if let Err(e) = self
                .typing_repo
                .clear_target(ConversationTarget::Channel(*channel_id))
                .await
            {
                warn!(channel_id, error = %e, "Failed to clear typing indicators");
            }
        }

        for file_id in removal.attachment_ids.iter().chain(removal.icon_id.iter()) {
            if let Err(e) = self.files.delete(file_id).await {
                warn!(file_id = %file_id, error = %e, "Failed to delete stored file");
            }
        }

        info!(
            server_id,
            channels = removal.channel_ids.len(),
            files = removal.attachment_ids.len(),
            "Server deleted"
        );
        Ok(())
    }
}
