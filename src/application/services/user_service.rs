//! User Service
//!
//! Profile sync from the identity provider, the user directory, privacy and
//! the admin-only operations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::application::services::direct_message_service::{
    DirectMessageError, DirectMessageService,
};
use crate::application::services::message_service::{
    CreateMessageDto, MessageError, MessageService,
};
use crate::domain::services::{AccessError, AccessGuard, AdminAllowList};
use crate::domain::{ConversationTarget, User, UserRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create or patch the user tied to an external identity.
    async fn upsert(&self, profile: UpsertUserDto) -> Result<User, UserError>;

    /// Delete the user tied to an external identity, if any.
    async fn remove_by_external_id(&self, external_id: &str) -> Result<bool, UserError>;

    /// Every user. Admin only.
    async fn list_all(&self, actor: &User) -> Result<Vec<User>, UserError>;

    /// Users that are not private.
    async fn list_public(&self) -> Result<Vec<User>, UserError>;

    /// Private users. Admin only.
    async fn list_private(&self, actor: &User) -> Result<Vec<User>, UserError>;

    /// Public users plus the caller.
    async fn list_visible(&self, actor: &User) -> Result<Vec<User>, UserError>;

    /// Change the caller's privacy flag.
    async fn set_privacy(&self, actor: &User, is_private: bool) -> Result<User, UserError>;

    /// Store the email carried by the caller's identity token.
    async fn sync_email(&self, actor: &User, email: Option<&str>) -> Result<User, UserError>;

    /// Set another user's email. Admin only.
    async fn set_email(&self, actor: &User, user_id: i64, email: &str) -> Result<User, UserError>;

    /// Message a user directly, opening the conversation if needed.
    /// Admin only. Returns the message id.
    async fn admin_send_direct_message(
        &self,
        actor: &User,
        target_user_id: i64,
        content: String,
    ) -> Result<i64, UserError>;
}

/// Profile pushed by the identity provider
#[derive(Debug, Clone)]
pub struct UpsertUserDto {
    pub external_id: String,
    pub username: String,
    pub image: String,
    pub email: Option<String>,
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("No email found in identity token")]
    MissingEmail,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    DirectMessage(#[from] DirectMessageError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AppError::NotFound(err.to_string()),
            UserError::MissingEmail => AppError::InvalidInput(err.to_string()),
            UserError::Access(e) => e.into(),
            UserError::DirectMessage(e) => e.into(),
            UserError::Message(e) => e.into(),
            UserError::Store(e) => e,
        }
    }
}

/// UserService implementation
pub struct UserServiceImpl {
    user_repo: Arc<dyn UserRepository>,
    direct_messages: Arc<dyn DirectMessageService>,
    messages: Arc<dyn MessageService>,
    admins: AdminAllowList,
    id_generator: Arc<SnowflakeGenerator>,
}

impl UserServiceImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        direct_messages: Arc<dyn DirectMessageService>,
        messages: Arc<dyn MessageService>,
        admins: AdminAllowList,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            user_repo,
            direct_messages,
            messages,
            admins,
            id_generator,
        }
    }

    async fn save_email(&self, mut user: User, email: &str) -> Result<User, UserError> {
        user.email = Some(email.to_string());
        user.role = self.admins.role_for(user.email.as_deref());
        Ok(self.user_repo.update(&user).await?)
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, profile), fields(external_id = %profile.external_id))]
    async fn upsert(&self, profile: UpsertUserDto) -> Result<User, UserError> {
        let role = self.admins.role_for(profile.email.as_deref());

        match self.user_repo.find_by_external_id(&profile.external_id).await? {
            Some(mut user) => {
                user.username = profile.username;
                user.image = profile.image;
                user.email = profile.email;
                user.role = role;
                Ok(self.user_repo.update(&user).await?)
            }
            None => {
                let user = User {
                    id: self.id_generator.generate(),
                    username: profile.username,
                    image: profile.image,
                    external_id: profile.external_id,
                    email: profile.email,
                    role,
                    is_private: false,
                    created_at: Utc::now(),
                };
                let created = self.user_repo.create(&user).await?;
                info!(user_id = created.id, "User created from identity event");
                Ok(created)
            }
        }
    }

    async fn remove_by_external_id(&self, external_id: &str) -> Result<bool, UserError> {
        let Some(user) = self.user_repo.find_by_external_id(external_id).await? else {
            return Ok(false);
        };
        self.user_repo.delete(user.id).await?;
        info!(user_id = user.id, "User removed after identity deletion");
        Ok(true)
    }

    async fn list_all(&self, actor: &User) -> Result<Vec<User>, UserError> {
        AccessGuard::require_admin(actor)?;
        Ok(self.user_repo.list_all().await?)
    }

    async fn list_public(&self) -> Result<Vec<User>, UserError> {
        Ok(self.user_repo.list_by_privacy(false).await?)
    }

    async fn list_private(&self, actor: &User) -> Result<Vec<User>, UserError> {
        AccessGuard::require_admin(actor)?;
        Ok(self.user_repo.list_by_privacy(true).await?)
    }

    async fn list_visible(&self, actor: &User) -> Result<Vec<User>, UserError> {
        let mut users = self.user_repo.list_by_privacy(false).await?;
        if actor.is_private {
            users.push(actor.clone());
        }
        Ok(users)
    }

    async fn set_privacy(&self, actor: &User, is_private: bool) -> Result<User, UserError> {
        Ok(self.user_repo.set_privacy(actor.id, is_private).await?)
    }

    async fn sync_email(&self, actor: &User, email: Option<&str>) -> Result<User, UserError> {
        let email = email.ok_or(UserError::MissingEmail)?;
        self.save_email(actor.clone(), email).await
    }

    #[instrument(skip(self, actor), fields(actor_id = actor.id))]
    async fn set_email(&self, actor: &User, user_id: i64, email: &str) -> Result<User, UserError> {
        AccessGuard::require_admin(actor)?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;
        self.save_email(user, email).await
    }

    #[instrument(skip(self, actor, content), fields(actor_id = actor.id))]
    async fn admin_send_direct_message(
        &self,
        actor: &User,
        target_user_id: i64,
        content: String,
    ) -> Result<i64, UserError> {
        AccessGuard::require_admin(actor)?;

        let dm = self.direct_messages.open(actor.id, target_user_id).await?;
        let dm_id: i64 = dm
            .id
            .parse()
            .map_err(|_| AppError::Internal("malformed direct message id".into()))?;

        let created = self
            .messages
            .create(
                actor.id,
                CreateMessageDto {
                    target: ConversationTarget::DirectMessage(dm_id),
                    content,
                    attachment_id: None,
                },
            )
            .await?;

        Ok(created.message.id)
    }
}
